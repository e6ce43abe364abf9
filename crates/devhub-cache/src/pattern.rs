//! Glob matching for cache key patterns.
//!
//! Follows the semantics of Redis `KEYS` / `SCAN MATCH` so that the in-memory
//! backend invalidates exactly the keys a Redis server would:
//!
//! - `*` matches any run of characters (including none)
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]` and `[^x]` match character classes
//! - `\` makes the next character literal

const METACHARACTERS: [char; 5] = ['*', '?', '[', ']', '\\'];

/// Returns `true` when `key` matches the glob `pattern`.
pub fn matches(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();

    let (mut pi, mut ki) = (0, 0);
    // Position just after the last `*` and the key index it is currently absorbing up to.
    let mut backtrack: Option<(usize, usize)> = None;

    while ki < key.len() {
        if pi < pattern.len() {
            match pattern[pi] {
                '*' => {
                    while pi < pattern.len() && pattern[pi] == '*' {
                        pi += 1;
                    }
                    if pi == pattern.len() {
                        return true;
                    }
                    backtrack = Some((pi, ki));
                    continue;
                }
                '?' => {
                    pi += 1;
                    ki += 1;
                    continue;
                }
                '[' => {
                    let (matched, next) = match_class(&pattern, pi, key[ki]);
                    if matched {
                        pi = next;
                        ki += 1;
                        continue;
                    }
                }
                '\\' if pi + 1 < pattern.len() => {
                    if pattern[pi + 1] == key[ki] {
                        pi += 2;
                        ki += 1;
                        continue;
                    }
                }
                literal => {
                    if literal == key[ki] {
                        pi += 1;
                        ki += 1;
                        continue;
                    }
                }
            }
        }

        match backtrack {
            Some((star_pi, star_ki)) => {
                backtrack = Some((star_pi, star_ki + 1));
                pi = star_pi;
                ki = star_ki + 1;
            }
            None => return false,
        }
    }

    while pi < pattern.len() && pattern[pi] == '*' {
        pi += 1;
    }
    pi == pattern.len()
}

/// Matches `c` against the class opening at `open`.
///
/// Returns whether it matched and the pattern index just past the closing `]`.
/// An unterminated class runs to the end of the pattern.
fn match_class(pattern: &[char], open: usize, c: char) -> (bool, usize) {
    let mut i = open + 1;
    let negate = pattern.get(i) == Some(&'^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    while i < pattern.len() && pattern[i] != ']' {
        if pattern[i] == '\\' && i + 1 < pattern.len() {
            matched |= pattern[i + 1] == c;
            i += 2;
        } else if i + 2 < pattern.len() && pattern[i + 1] == '-' && pattern[i + 2] != ']' {
            let (lo, hi) = if pattern[i] <= pattern[i + 2] {
                (pattern[i], pattern[i + 2])
            } else {
                (pattern[i + 2], pattern[i])
            };
            matched |= lo <= c && c <= hi;
            i += 3;
        } else {
            matched |= pattern[i] == c;
            i += 1;
        }
    }

    let next = if i < pattern.len() { i + 1 } else { i };
    (matched != negate, next)
}

/// Escapes glob metacharacters so `literal` only ever matches itself.
pub fn escape(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if METACHARACTERS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Pattern matching every key that starts with the literal `prefix`.
pub fn prefix(prefix: &str) -> String {
    format!("{}*", escape(prefix))
}
