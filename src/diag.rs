use std::collections::BTreeMap;

/// Operation counters and fault messages, attached to a document on
/// request. A document without one pays nothing: every hook checks for
/// `None` and returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    counts: BTreeMap<&'static str, u64>,
    messages: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn tally(&mut self, op: &'static str) {
        *self.counts.entry(op).or_insert(0) += 1;
    }

    pub(crate) fn report(&mut self, message: String) {
        self.messages.push(message);
    }

    /// How many times the named operation ran. Unknown names count zero.
    pub fn count(&self, op: &str) -> u64 {
        self.counts.get(op).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.counts.iter().map(|(&op, &n)| (op, n))
    }

    /// Every fault recorded since the last clear, oldest first. Sticky
    /// status rules suppress later faults on a node; the messages here keep
    /// all of them.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.counts.clear();
        self.messages.clear();
    }
}
