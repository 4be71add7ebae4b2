//! Just enough CSS selector support for the in-memory document:
//! `tag`, `#id`, `.class`, `[attr]`, `[attr=value]`, compounds of those,
//! descendant combinators and comma-separated lists.

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, Option<String>)>,
}

/// One alternative of a selector list: compounds joined by descendant
/// combinators, outermost first.
pub type Chain = Vec<Compound>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selector {
    pub alternatives: Vec<Chain>,
}

/// Read-only view of an element, as the matcher needs it.
pub trait Matchable {
    fn tag(&self) -> &str;
    fn attr(&self, name: &str) -> Option<&str>;
    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|x| x == class))
    }
}

fn is_ident(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &[char], i: &mut usize) -> String {
    let start = *i;
    while *i < chars.len() && is_ident(chars[*i]) {
        *i += 1;
    }
    chars[start..*i].iter().collect()
}

fn parse_compound(src: &str) -> Option<Compound> {
    let chars: Vec<char> = src.chars().collect();
    let mut c = Compound::default();
    let mut i = 0;
    if i < chars.len() && chars[i] == '*' {
        i += 1;
    } else if i < chars.len() && is_ident(chars[i]) {
        c.tag = Some(take_ident(&chars, &mut i).to_ascii_lowercase());
    }
    while i < chars.len() {
        match chars[i] {
            '#' => {
                i += 1;
                c.id = Some(take_ident(&chars, &mut i));
            }
            '.' => {
                i += 1;
                c.classes.push(take_ident(&chars, &mut i));
            }
            '[' => {
                let close = chars[i..].iter().position(|ch| *ch == ']')? + i;
                let inner: String = chars[i + 1..close].iter().collect();
                let (name, value) = match inner.split_once('=') {
                    Some((n, v)) => (
                        n.trim().to_string(),
                        Some(v.trim().trim_matches(|q| q == '"' || q == '\'').to_string()),
                    ),
                    None => (inner.trim().to_string(), None),
                };
                c.attrs.push((name, value));
                i = close + 1;
            }
            _ => return None,
        }
    }
    Some(c)
}

impl Selector {
    /// Parse a selector list. Unsupported syntax yields `None`.
    pub fn parse(src: &str) -> Option<Self> {
        let mut alternatives = Vec::new();
        for alt in src.split(',') {
            let chain: Option<Chain> = alt.split_whitespace().map(parse_compound).collect();
            let chain = chain?;
            if chain.is_empty() {
                return None;
            }
            alternatives.push(chain);
        }
        Some(Self { alternatives })
    }

    /// Does `el` match? `ancestors` yields the element's ancestors, nearest
    /// first.
    pub fn matches<'a, M, I>(&self, el: &M, ancestors: I) -> bool
    where
        M: Matchable + 'a,
        I: Iterator<Item = &'a M> + Clone,
    {
        self.alternatives
            .iter()
            .any(|chain| chain_matches(chain, el, ancestors.clone()))
    }
}

impl Compound {
    pub fn matches<M: Matchable>(&self, el: &M) -> bool {
        if let Some(tag) = &self.tag {
            if !el.tag().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|(name, value)| match (el.attr(name), value) {
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => actual == expected,
            (None, _) => false,
        })
    }
}

fn chain_matches<'a, M, I>(chain: &[Compound], el: &M, mut ancestors: I) -> bool
where
    M: Matchable + 'a,
    I: Iterator<Item = &'a M>,
{
    let Some((last, rest)) = chain.split_last() else {
        return false;
    };
    if !last.matches(el) {
        return false;
    }
    let mut pending = rest.iter().rev().peekable();
    while let Some(want) = pending.peek() {
        match ancestors.next() {
            Some(a) if want.matches(a) => {
                pending.next();
            }
            Some(_) => {}
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    struct El(&'static str, Vec<(&'static str, &'static str)>);

    impl Matchable for El {
        fn tag(&self) -> &str {
            self.0
        }
        fn attr(&self, name: &str) -> Option<&str> {
            self.1.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
        }
    }

    #[test]
    fn compounds_and_descendants() {
        let pane = El("div", vec![("id", "courseWindow")]);
        let el = El("div", vec![("class", "animateMe typewriter"), ("data-chain", "#b")]);
        let ancestors = [&pane];

        let s = Selector::parse(".animateMe").unwrap();
        assert!(s.matches(&el, ancestors.iter().copied()));
        let s = Selector::parse("div.animateMe.typewriter[data-chain]").unwrap();
        assert!(s.matches(&el, ancestors.iter().copied()));
        let s = Selector::parse("#courseWindow .animateMe").unwrap();
        assert!(s.matches(&el, ancestors.iter().copied()));
        let s = Selector::parse("#other .animateMe, span").unwrap();
        assert!(!s.matches(&el, ancestors.iter().copied()));
        let s = Selector::parse("[data-chain='#b']").unwrap();
        assert!(s.matches(&el, ancestors.iter().copied()));
        assert!(Selector::parse("div > p").is_none());
    }
}
