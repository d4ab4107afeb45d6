//! Set filters applied while enumerating the set list.
//!
//! Every filter must accept a set for it to be ingested (AND). All filters
//! except [`MaxCount`] are pure; `MaxCount` counts the sets it lets through
//! and is only valid for one enumeration pass.

use chrono::NaiveDate;
use rustc_hash::FxHashSet;

use crate::schema::RemoteSet;

/// A predicate over sets.
pub trait SetFilter: Send {
    fn should_include(&mut self, set: &RemoteSet) -> bool;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Excludes digital-only sets (Arena, MTGO).
#[derive(Debug, Clone, Copy, Default)]
pub struct NonDigital;

impl SetFilter for NonDigital {
    fn should_include(&mut self, set: &RemoteSet) -> bool {
        !set.digital
    }

    fn name(&self) -> &'static str {
        "non-digital"
    }
}

/// Excludes sets that have not been released yet (previews).
///
/// Sets without a release date are kept.
#[derive(Debug, Clone, Copy)]
pub struct NonPreview {
    pub today: NaiveDate,
}

impl SetFilter for NonPreview {
    fn should_include(&mut self, set: &RemoteSet) -> bool {
        set.released_at.is_none_or(|d| d <= self.today)
    }

    fn name(&self) -> &'static str {
        "non-preview"
    }
}

fn lowercase_set(items: impl IntoIterator<Item = impl AsRef<str>>) -> FxHashSet<String> {
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Excludes sets by code or by set type.
#[derive(Debug, Clone, Default)]
pub struct Denylist {
    codes: FxHashSet<String>,
    set_types: FxHashSet<String>,
}

impl Denylist {
    pub fn new(
        codes: impl IntoIterator<Item = impl AsRef<str>>,
        set_types: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Self {
        Self {
            codes: lowercase_set(codes),
            set_types: lowercase_set(set_types),
        }
    }
}

impl SetFilter for Denylist {
    fn should_include(&mut self, set: &RemoteSet) -> bool {
        !self.codes.contains(&set.code.to_ascii_lowercase())
            && !self.set_types.contains(&set.set_type.to_ascii_lowercase())
    }

    fn name(&self) -> &'static str {
        "denylist"
    }
}

/// Keeps only the listed set codes. An empty list keeps everything.
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    codes: FxHashSet<String>,
}

impl Allowlist {
    pub fn new(codes: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Self {
            codes: lowercase_set(codes),
        }
    }
}

impl SetFilter for Allowlist {
    fn should_include(&mut self, set: &RemoteSet) -> bool {
        self.codes.is_empty() || self.codes.contains(&set.code.to_ascii_lowercase())
    }

    fn name(&self) -> &'static str {
        "allowlist"
    }
}

/// Lets through at most `max` sets, then rejects everything.
#[derive(Debug, Clone)]
pub struct MaxCount {
    max: usize,
    seen: usize,
}

impl MaxCount {
    pub fn new(max: usize) -> Self {
        Self { max, seen: 0 }
    }
}

impl SetFilter for MaxCount {
    fn should_include(&mut self, _set: &RemoteSet) -> bool {
        if self.seen < self.max {
            self.seen += 1;
            true
        } else {
            false
        }
    }

    fn name(&self) -> &'static str {
        "max-count"
    }
}

/// AND of several filters, evaluated in order with short-circuit.
///
/// The count cap is held apart and consulted last, so it only counts sets
/// every other filter accepted.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn SetFilter>>,
    cap: Option<MaxCount>,
    rejected: usize,
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.filters.iter().map(|f| f.name()).collect();
        f.debug_struct("FilterChain")
            .field("filters", &names)
            .field("cap", &self.cap)
            .finish()
    }
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: impl SetFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn with_cap(mut self, max: usize) -> Self {
        self.cap = Some(MaxCount::new(max));
        self
    }

    pub fn should_include(&mut self, set: &RemoteSet) -> bool {
        let mut passed = true;
        for filter in &mut self.filters {
            if !filter.should_include(set) {
                log::trace!("{}: rejected by {}", set.code, filter.name());
                passed = false;
                break;
            }
        }
        if passed {
            if let Some(cap) = self.cap.as_mut() {
                passed = cap.should_include(set);
            }
        }
        if !passed {
            self.rejected += 1;
        }
        passed
    }

    /// Sets rejected so far
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(code: &str) -> RemoteSet {
        RemoteSet {
            id: format!("id-{code}"),
            code: code.to_string(),
            name: code.to_uppercase(),
            set_type: "expansion".to_string(),
            digital: false,
            parent_set_code: None,
            block_code: None,
            block: None,
            released_at: NaiveDate::from_ymd_opt(2020, 1, 1),
            card_count: 100,
            icon_svg_uri: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn digital_set_excluded_regardless_of_order() {
        let mut digital = set("ymid");
        digital.digital = true;

        let mut a = FilterChain::new()
            .with(NonDigital)
            .with(Allowlist::new(["ymid"]));
        let mut b = FilterChain::new()
            .with(Allowlist::new(["ymid"]))
            .with(NonPreview { today: today() })
            .with(NonDigital);
        assert!(!a.should_include(&digital));
        assert!(!b.should_include(&digital));
    }

    #[test]
    fn preview_excluded() {
        let mut upcoming = set("fdn");
        upcoming.released_at = NaiveDate::from_ymd_opt(2024, 11, 15);
        let mut f = NonPreview { today: today() };
        assert!(!f.should_include(&upcoming));
        assert!(f.should_include(&set("lea")));

        let mut undated = set("xyz");
        undated.released_at = None;
        assert!(f.should_include(&undated));
    }

    #[test]
    fn denylist_by_code_and_type() {
        let mut f = Denylist::new(["LEA"], ["token"]);
        assert!(!f.should_include(&set("lea")));
        let mut token = set("tmkm");
        token.set_type = "token".to_string();
        assert!(!f.should_include(&token));
        assert!(f.should_include(&set("leb")));
    }

    #[test]
    fn empty_allowlist_keeps_all() {
        let mut f = Allowlist::new(Vec::<String>::new());
        assert!(f.should_include(&set("anything")));
    }

    #[test]
    fn cap_counts_only_accepted_sets() {
        let mut digital = set("ymid");
        digital.digital = true;

        let mut chain = FilterChain::new().with(NonDigital).with_cap(2);
        assert!(!chain.should_include(&digital));
        assert!(chain.should_include(&set("a")));
        assert!(!chain.should_include(&digital));
        assert!(chain.should_include(&set("b")));
        assert!(!chain.should_include(&set("c")));
        assert_eq!(chain.rejected(), 3);
    }

    #[test]
    fn empty_chain_accepts() {
        let mut chain = FilterChain::new();
        assert!(chain.should_include(&set("lea")));
    }
}
