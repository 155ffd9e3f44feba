//! Equal-weight portfolio targets.

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioTarget {
    pub symbol: String,
    pub weight: f64,
}

/// One target per symbol, each weighted 1/n. Empty input gives an empty set.
pub fn equal_weight<'a, I>(symbols: I) -> Vec<PortfolioTarget>
where
    I: IntoIterator<Item = &'a String>,
{
    let symbols: Vec<&String> = symbols.into_iter().collect();
    if symbols.is_empty() {
        return Vec::new();
    }
    let weight = 1.0 / symbols.len() as f64;
    symbols
        .into_iter()
        .map(|symbol| PortfolioTarget {
            symbol: symbol.clone(),
            weight,
        })
        .collect()
}

pub fn total_weight(targets: &[PortfolioTarget]) -> f64 {
    targets.iter().map(|t| t.weight).sum()
}
