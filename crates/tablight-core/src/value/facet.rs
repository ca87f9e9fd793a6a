/// An integer tag selecting which aspect of a cell's value to read: the
/// display text, the raw stored value, a check state, and so on. Sources are
/// free to define additional facets above [`Facet::CHECK`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Facet(pub u16);

impl Facet {
    /// The user-visible text of a cell. The default facet.
    pub const DISPLAY: Facet = Facet(0);

    /// The raw stored value behind the display text.
    pub const RAW: Facet = Facet(1);

    /// A check/toggle state attached to the cell.
    pub const CHECK: Facet = Facet(2);
}

impl From<u16> for Facet {
    fn from(src: u16) -> Self {
        Facet(src)
    }
}
