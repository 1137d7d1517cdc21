/// A held instrument as reported by the holdings database, in Interactive Brokers notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holding {
    pub symbol: String,
    pub exchange: String,
    pub isin: Option<String>,
}
