/// Grammar accepted by the parser.
///
/// `Strict` is standard JSON. `Flex` layers the permissive superset on top:
/// `//` and `/* */` comments, single-quoted strings, unquoted bareword
/// literals and blank-as-null. The three switches can be toggled
/// independently; children created during a parse inherit the mode of the
/// parse that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrammarMode {
    #[default]
    Strict,
    Flex {
        single_quotes: bool,
        comments: bool,
        barewords: bool,
    },
}

impl GrammarMode {
    /// The full superset: comments, single quotes and barewords all on.
    pub const fn flex() -> Self {
        GrammarMode::Flex {
            single_quotes: true,
            comments: true,
            barewords: true,
        }
    }

    pub const fn is_flex(self) -> bool {
        matches!(self, GrammarMode::Flex { .. })
    }

    pub(crate) const fn allows_single_quotes(self) -> bool {
        matches!(
            self,
            GrammarMode::Flex {
                single_quotes: true,
                ..
            }
        )
    }

    pub(crate) const fn allows_comments(self) -> bool {
        matches!(self, GrammarMode::Flex { comments: true, .. })
    }

    pub(crate) const fn allows_barewords(self) -> bool {
        matches!(
            self,
            GrammarMode::Flex {
                barewords: true,
                ..
            }
        )
    }
}

/// Options for turning text into a document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub mode: GrammarMode,
    /// Record whitespace/comment fragments and source positions so an
    /// unmutated tree serializes byte-identically.
    pub preserve_formatting: bool,
    /// Tolerate trailing text after the parsed item instead of failing;
    /// the tail is kept as terminal formatting.
    pub clip_trailing: bool,
    /// Upper bound on parser loop iterations. `None` derives a budget from
    /// the input length.
    pub step_limit: Option<usize>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict JSON, no preservation. Same as `default()`.
    pub fn strict() -> Self {
        Self::default()
    }

    /// The full Flex superset.
    pub fn flex() -> Self {
        Self::default().with_mode(GrammarMode::flex())
    }

    pub fn with_mode(mut self, mode: GrammarMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_preserve_formatting(mut self, preserve: bool) -> Self {
        self.preserve_formatting = preserve;
        self
    }

    pub fn with_clip_trailing(mut self, clip: bool) -> Self {
        self.clip_trailing = clip;
        self
    }

    pub fn with_step_limit(mut self, limit: Option<usize>) -> Self {
        self.step_limit = limit;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            mode: GrammarMode::Strict,
            preserve_formatting: false,
            clip_trailing: false,
            step_limit: None,
        }
    }
}

/// Options for re-emitting text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    /// Also escape `'` inside strings, for output that may be re-read with
    /// single-quote support enabled.
    pub escape_single_quotes: bool,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_escape_single_quotes(mut self, escape: bool) -> Self {
        self.escape_single_quotes = escape;
        self
    }
}
