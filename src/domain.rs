/// Wildcard hostname patterns for the domain filter
use regex::{Regex, RegexBuilder};

/// A domain filter compiled once and reused for every match.
///
/// Pattern rules:
/// 1. Empty pattern → matches every hostname
/// 2. `.` matches a literal dot
/// 3. `*` matches any run of characters, including none
/// 4. The whole hostname must match, case-insensitively
/// 5. A pattern that fails to compile matches nothing
///
/// Examples:
/// - `*.crm.com` matches app.crm.com, not crm.com
/// - `a.*.com` matches a.b.com
#[derive(Debug, Clone)]
pub enum DomainPattern {
    Any,
    Wildcard(Regex),
    Invalid,
}

impl DomainPattern {
    pub fn compile(pattern: &str) -> DomainPattern {
        if pattern.is_empty() {
            return DomainPattern::Any;
        }

        let expression = format!("^{}$", pattern.replace('.', "\\.").replace('*', ".*"));

        match RegexBuilder::new(&expression).case_insensitive(true).build() {
            Ok(regex) => DomainPattern::Wildcard(regex),
            Err(e) => {
                log::debug!("Domain filter {:?} does not compile: {}", pattern, e);
                DomainPattern::Invalid
            }
        }
    }

    pub fn matches(&self, hostname: &str) -> bool {
        match self {
            DomainPattern::Any => true,
            DomainPattern::Wildcard(regex) => regex.is_match(hostname),
            DomainPattern::Invalid => false,
        }
    }
}

impl Default for DomainPattern {
    fn default() -> Self {
        DomainPattern::Any
    }
}

/// One-off match of a hostname against a wildcard pattern
pub fn matches(pattern: &str, hostname: &str) -> bool {
    DomainPattern::compile(pattern).matches(hostname)
}
