/// A reference token split into its colon-separated segments.
///
/// The two-segment shape is ambiguous between `category:block` and
/// `block:stage`; callers decide which reading applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// `[block]`
    Bare(&'a str),
    /// `[category:block]` or `[block:stage]`
    Pair(&'a str, &'a str),
    /// `[category:block:stage]`
    Full {
        category: &'a str,
        block: &'a str,
        stage: &'a str,
    },
}

impl<'a> Reference<'a> {
    /// Parses a token, with or without its enclosing brackets.
    ///
    /// Returns `None` when the token has more than three segments. Segments
    /// are not checked against identifier syntax here; tokens produced by the
    /// pattern matcher already satisfy it.
    pub fn parse(token: &'a str) -> Option<Self> {
        let token = token.trim_matches(|c| c == '[' || c == ']');
        let mut parts = token.split(':');
        let first = parts.next()?;
        let second = parts.next();
        let third = parts.next();
        if parts.next().is_some() {
            return None;
        }

        Some(match (second, third) {
            (None, _) => Reference::Bare(first),
            (Some(second), None) => Reference::Pair(first, second),
            (Some(block), Some(stage)) => Reference::Full {
                category: first,
                block,
                stage,
            },
        })
    }

    /// Number of segments in the token.
    pub fn segment_count(&self) -> usize {
        match self {
            Reference::Bare(_) => 1,
            Reference::Pair(..) => 2,
            Reference::Full { .. } => 3,
        }
    }

    /// Whether this reference names the given block.
    ///
    /// Matching is loose: a bare name matches regardless of
    /// category, and a pair matches either as `category:block` or as
    /// `block:<any stage>`. Stage names are never checked.
    pub fn matches_target(&self, target_category: &str, target_block: &str) -> bool {
        match *self {
            Reference::Bare(name) => name == target_block,
            Reference::Pair(first, second) => {
                (first == target_category && second == target_block) || first == target_block
            }
            Reference::Full {
                category, block, ..
            } => category == target_category && block == target_block,
        }
    }
}
