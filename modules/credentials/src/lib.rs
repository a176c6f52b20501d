//! Offline SHA-1 lookup against a password wordlist, optionally combined with known salts.

use log::{debug, info, warn};
use regex::Regex;
use sha1::{Digest, Sha1};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use toolbox_core::sources;

/// Printed in place of a plaintext when nothing matched.
pub const NOT_FOUND: &str = "PASSWORD NOT IN DATABASE";

pub const DEFAULT_WORDLIST: &str = "top-10000-passwords.txt";
pub const DEFAULT_SALTS: &str = "known-salts.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrackOutcome {
    Found(String),
    NotFound,
}

impl CrackOutcome {
    pub fn plaintext(&self) -> Option<&str> {
        match self {
            CrackOutcome::Found(p) => Some(p),
            CrackOutcome::NotFound => None,
        }
    }
}

impl fmt::Display for CrackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plaintext().unwrap_or(NOT_FOUND))
    }
}

/// Candidate plaintexts, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wordlist(Vec<String>);

/// Salts, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaltList(Vec<String>);

macro_rules! line_list {
    ($t:ident) => {
        impl $t {
            pub fn from_text(content: &str) -> Self { $t(sources::parse_lines(content)) }

            pub fn load(path: &Path) -> std::io::Result<Self> { Ok($t(sources::read_lines(path)?)) }

            pub fn entries(&self) -> &[String] { &self.0 }

            pub fn len(&self) -> usize { self.0.len() }

            pub fn is_empty(&self) -> bool { self.0.is_empty() }

            /// Number of distinct entries.
            pub fn unique(&self) -> usize {
                self.0.iter().collect::<std::collections::HashSet<_>>().len()
            }
        }

        impl<S: Into<String>> FromIterator<S> for $t {
            fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
                $t(iter.into_iter().map(Into::into).collect())
            }
        }
    };
}

line_list!(Wordlist);
line_list!(SaltList);

/// Where the wordlist and salt list are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSources {
    pub passwords: PathBuf,
    pub salts: PathBuf,
}

impl Default for DataSources {
    fn default() -> Self {
        DataSources { passwords: PathBuf::from(DEFAULT_WORDLIST), salts: PathBuf::from(DEFAULT_SALTS) }
    }
}

pub fn sha1_hex(s: &str) -> String {
    hex::encode(Sha1::digest(s.as_bytes()))
}

/// 40 lowercase hex characters, the only form a match is possible against.
pub fn is_sha1_hex(s: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-f0-9]{40}$").unwrap()).is_match(s)
}

fn hashes_to(target: &[u8; 20], a: &str, b: &str) -> bool {
    Sha1::new().chain_update(a).chain_update(b).finalize().as_slice() == &target[..]
}

/// Linear search of `words` for the plaintext of `digest`.
///
/// Without salts each word is hashed alone. With salts every word is tried against every
/// salt, word-major, salt prefixed before salt suffixed; the first hit is returned.
pub fn find_plaintext(digest: &str, words: &Wordlist, salts: Option<&SaltList>) -> CrackOutcome {
    if !is_sha1_hex(digest) {
        debug!("{:?} is not a lowercase sha1 hex digest", digest);
        return CrackOutcome::NotFound;
    }
    let mut target = [0u8; 20];
    if hex::decode_to_slice(digest, &mut target).is_err() {
        return CrackOutcome::NotFound;
    }

    let hit = match salts {
        None => words.entries().iter().find(|w| hashes_to(&target, "", w)),
        Some(salts) => words.entries().iter().find(|w| {
            salts.entries().iter().any(|s| hashes_to(&target, s, w) || hashes_to(&target, w, s))
        }),
    };
    match hit {
        Some(w) => {
            debug!("{} matched", digest);
            CrackOutcome::Found(w.clone())
        }
        None => CrackOutcome::NotFound,
    }
}

/// Load the configured sources and search them.
///
/// An unreadable wordlist or salt list means there is nothing to search, so the result is
/// `NotFound` rather than an error.
pub fn crack_sha1_hash(digest: &str, use_salts: bool, sources: &DataSources) -> CrackOutcome {
    let words = match Wordlist::load(&sources.passwords) {
        Ok(w) => w,
        Err(e) => {
            warn!("wordlist {} unavailable: {}", sources.passwords.display(), e);
            return CrackOutcome::NotFound;
        }
    };
    let salts = if use_salts {
        match SaltList::load(&sources.salts) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("salt list {} unavailable: {}", sources.salts.display(), e);
                return CrackOutcome::NotFound;
            }
        }
    } else {
        None
    };
    info!(
        "searching {} words{}",
        words.len(),
        salts.as_ref().map(|s| format!(" x {} salts", s.len())).unwrap_or_default()
    );
    find_plaintext(digest, &words, salts.as_ref())
}

/// Total and distinct entry counts of a newline-delimited list.
pub fn wordlist_stats(content: &str) -> (usize, usize) {
    let w = Wordlist::from_text(content);
    (w.len(), w.unique())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn words() -> Wordlist {
        Wordlist::from_text("123456\npassword\nsammy123\nabacab\nsuperman\nq1w2e3r4t5\nbubbles1\n")
    }

    fn salts() -> SaltList {
        SaltList::from_text("pepper\nnaCl\n")
    }

    #[test]
    fn sha1_known_vectors() {
        assert_eq!(sha1_hex("password"), "5baa61e4c9b93f3f0682250b6cf8331b7ee68fd8");
        assert_eq!(sha1_hex(""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert!(is_sha1_hex(&sha1_hex("abc")));
        assert!(!is_sha1_hex("5BAA61E4C9B93F3F0682250B6CF8331B7EE68FD8"));
        assert!(!is_sha1_hex("invalid_hash"));
    }

    #[test]
    fn unsalted_hits() {
        let w = words();
        assert_eq!(find_plaintext("b305921a3723cd5d70a375cd21a61e60aabb84ec", &w, None), CrackOutcome::Found("sammy123".into()));
        assert_eq!(find_plaintext("c7ab388a5ebefbf4d550652f1eb4d833e5316e3e", &w, None), CrackOutcome::Found("abacab".into()));
        assert_eq!(find_plaintext("5baa61e4c9b93f3f0682250b6cf8331b7ee68fd8", &w, None), CrackOutcome::Found("password".into()));
    }

    #[test]
    fn misses_and_malformed_digests() {
        let w = words();
        let fake = "a".repeat(40);
        assert_eq!(find_plaintext(&fake, &w, None), CrackOutcome::NotFound);
        assert_eq!(find_plaintext(&fake, &w, Some(&salts())), CrackOutcome::NotFound);
        assert_eq!(find_plaintext("", &w, None), CrackOutcome::NotFound);
        assert_eq!(find_plaintext("invalid_hash", &w, None), CrackOutcome::NotFound);
        // digests compare case-sensitively
        let upper = sha1_hex("password").to_uppercase();
        assert_eq!(find_plaintext(&upper, &w, None), CrackOutcome::NotFound);
    }

    #[test]
    fn salted_prefix_and_suffix() {
        let (w, s) = (words(), salts());
        let prefixed = sha1_hex("naClsuperman");
        let suffixed = sha1_hex("bubbles1pepper");
        assert_eq!(find_plaintext(&prefixed, &w, Some(&s)), CrackOutcome::Found("superman".into()));
        assert_eq!(find_plaintext(&suffixed, &w, Some(&s)), CrackOutcome::Found("bubbles1".into()));
        // salted mode does not try the bare password
        assert_eq!(find_plaintext(&sha1_hex("superman"), &w, Some(&s)), CrackOutcome::NotFound);
    }

    #[test]
    fn blank_lines_are_candidates() {
        let w = Wordlist::from_text("alpha\n\nbeta\n");
        assert_eq!(w.entries(), ["alpha", "", "beta"]);
        assert_eq!(find_plaintext(&sha1_hex(""), &w, None), CrackOutcome::Found(String::new()));

        // an empty salt makes salted mode hit the bare password
        let s = SaltList::from_text("x\n\n");
        assert_eq!(s.len(), 2);
        assert_eq!(find_plaintext(&sha1_hex("beta"), &w, Some(&s)), CrackOutcome::Found("beta".into()));
    }

    #[test]
    fn blank_lines_survive_loading_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = DataSources { passwords: dir.path().join("pw.txt"), salts: dir.path().join("salts.txt") };
        fs::write(&src.passwords, "hunter2\n   \nletmein\n").unwrap();
        fs::write(&src.salts, "\nzz\n").unwrap();
        assert_eq!(crack_sha1_hash(&sha1_hex(""), false, &src), CrackOutcome::Found(String::new()));
        assert_eq!(crack_sha1_hash(&sha1_hex("letmein"), true, &src), CrackOutcome::Found("letmein".into()));
    }

    #[test]
    fn salted_search_is_word_major() {
        let w: Wordlist = ["b", "a"].into_iter().collect();
        let s: SaltList = ["a", "b"].into_iter().collect();
        // "ab" is salt "a" + word "b" and also word "a" + salt "b"
        assert_eq!(find_plaintext(&sha1_hex("ab"), &w, Some(&s)), CrackOutcome::Found("b".into()));
    }

    #[test]
    fn crack_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let src = DataSources { passwords: dir.path().join("pw.txt"), salts: dir.path().join("salts.txt") };
        fs::write(&src.passwords, "letmein\nq1w2e3r4t5\n").unwrap();
        fs::write(&src.salts, "x9\n").unwrap();

        assert_eq!(crack_sha1_hash(&sha1_hex("letmein"), false, &src).to_string(), "letmein");
        assert_eq!(crack_sha1_hash(&sha1_hex("x9q1w2e3r4t5"), true, &src).to_string(), "q1w2e3r4t5");
        assert_eq!(crack_sha1_hash(&"a".repeat(40), false, &src).to_string(), NOT_FOUND);
    }

    #[test]
    fn missing_sources_mean_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut src = DataSources { passwords: dir.path().join("absent.txt"), salts: dir.path().join("absent-salts.txt") };
        assert_eq!(crack_sha1_hash(&sha1_hex("password"), false, &src), CrackOutcome::NotFound);

        fs::write(&src.passwords, "password\n").unwrap();
        assert_eq!(crack_sha1_hash(&sha1_hex("password"), false, &src), CrackOutcome::Found("password".into()));
        assert_eq!(crack_sha1_hash(&sha1_hex("password"), true, &src), CrackOutcome::NotFound);

        src.salts = src.passwords.clone();
        assert_eq!(crack_sha1_hash(&sha1_hex("passwordpassword"), true, &src), CrackOutcome::Found("password".into()));
    }

    #[test]
    fn stats_count_total_and_unique() {
        assert_eq!(wordlist_stats("a\nb\n\na\n  b \nc"), (6, 4));
        assert_eq!(DataSources::default().passwords, PathBuf::from(DEFAULT_WORDLIST));
    }
}
