//! Open-high-low-close role inference for stock charts.

use serde::Serialize;

use super::plot::Candle;

/// Title suffix for stock charts drawn as a plain close series.
pub const CLOSE_ONLY_SUFFIX: &str = " (Close only)";

/// Index of the series playing each role.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StockRoles {
    pub open: Option<usize>,
    pub high: Option<usize>,
    pub low: Option<usize>,
    pub close: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Open,
    High,
    Low,
    Close,
}

const ROLE_ORDER: [Role; 4] = [Role::Open, Role::High, Role::Low, Role::Close];

impl Role {
    fn matches(self, lower_name: &str) -> bool {
        match self {
            Self::Open => lower_name.contains("open"),
            Self::High => lower_name.contains("high"),
            Self::Low => lower_name.contains("low"),
            Self::Close => lower_name.contains("close") || lower_name.contains("last"),
        }
    }
}

impl StockRoles {
    fn slot(&mut self, role: Role) -> &mut Option<usize> {
        match role {
            Role::Open => &mut self.open,
            Role::High => &mut self.high,
            Role::Low => &mut self.low,
            Role::Close => &mut self.close,
        }
    }

    fn get(&self, role: Role) -> Option<usize> {
        match role {
            Role::Open => self.open,
            Role::High => self.high,
            Role::Low => self.low,
            Role::Close => self.close,
        }
    }

    fn claimed(&self, index: usize) -> bool {
        [self.open, self.high, self.low, self.close].contains(&Some(index))
    }

    /// All four roles as `[open, high, low, close]`, if every one is filled.
    pub fn complete(&self) -> Option<[usize; 4]> {
        Some([self.open?, self.high?, self.low?, self.close?])
    }
}

/// Assign roles by series name, then fill the gaps by position.
///
/// Names match case-insensitively by substring (`open`, `high`, `low`,
/// `close`/`last`); the first series matching a role claims it. Roles left
/// over take the remaining series in document order.
pub fn infer_roles<S: AsRef<str>>(names: &[S]) -> StockRoles {
    let mut roles = StockRoles::default();

    for (index, name) in names.iter().enumerate() {
        let lower = name.as_ref().to_lowercase();
        let matched = ROLE_ORDER
            .iter()
            .copied()
            .find(|role| role.matches(&lower) && roles.get(*role).is_none());
        if let Some(role) = matched {
            *roles.slot(role) = Some(index);
        }
    }

    for role in ROLE_ORDER {
        if roles.get(role).is_some() {
            continue;
        }
        let next = (0..names.len()).find(|&i| !roles.claimed(i));
        *roles.slot(role) = next;
    }

    roles
}

/// Candles for every index where all four roles have a value.
///
/// Returns `(index, candle)` pairs so callers can keep the matching labels.
pub fn aligned_candles(series: [&[Option<f64>]; 4]) -> Vec<(usize, Candle)> {
    let [open, high, low, close] = series;
    let len = open.len().min(high.len()).min(low.len()).min(close.len());

    (0..len)
        .filter_map(|i| {
            let candle = Candle {
                open: (*open.get(i)?)?,
                high: (*high.get(i)?)?,
                low: (*low.get(i)?)?,
                close: (*close.get(i)?)?,
            };
            Some((i, candle))
        })
        .collect()
}
