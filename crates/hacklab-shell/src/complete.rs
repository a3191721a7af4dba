//! Ranked tab-completion candidates for partially typed lines.
//!
//! Strictly read-only: nothing here mutates the session or the tree, and
//! nothing here returns an error. When the directory being completed
//! cannot be resolved, the candidate list is simply empty.

use hacklab_vfs::{SEPARATOR, Vfs, resolve};

use crate::registry;
use crate::session::SessionState;

/// A suggested continuation, used transiently to render suggestions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
    pub text: String,
    pub is_directory: bool,
}

/// Produce ranked candidates for `partial`, the line typed so far.
///
/// The token under the cursor is everything after the last whitespace.
/// Completing the first token with no separator in it suggests command
/// names; everything else completes as a path, with candidates sorted
/// lexicographically and directories ranked ahead of files on ties.
pub fn complete(partial: &str, session: &SessionState, vfs: &Vfs) -> Vec<CompletionCandidate> {
    let (before, token) = split_last_token(partial);
    let completing_command = before.trim().is_empty();

    if completing_command && !token.contains(SEPARATOR) {
        return registry::completions(token)
            .into_iter()
            .map(|text| CompletionCandidate {
                text,
                is_directory: false,
            })
            .collect();
    }

    // Split the token at its last separator into a directory portion and
    // the name prefix being typed.
    let (dir_part, prefix) = match token.rfind(SEPARATOR) {
        Some(i) => (&token[..=i], &token[i + 1..]),
        None => ("", token),
    };

    let dir = if dir_part.is_empty() {
        session.cwd().clone()
    } else {
        match resolve(session.cwd(), dir_part) {
            Ok(path) => path,
            Err(_) => return Vec::new(),
        }
    };

    let entries = match vfs.list(&dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut candidates: Vec<CompletionCandidate> = entries
        .into_iter()
        .filter(|e| e.name.starts_with(prefix))
        .map(|e| {
            let is_directory = e.is_directory();
            CompletionCandidate {
                text: e.name,
                is_directory,
            }
        })
        .collect();
    candidates.sort_by(|a, b| {
        a.text
            .cmp(&b.text)
            .then_with(|| b.is_directory.cmp(&a.is_directory))
    });
    candidates
}

/// Split a line into everything before the token under the cursor, and the
/// token itself.
fn split_last_token(partial: &str) -> (&str, &str) {
    match partial
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
    {
        Some((i, c)) => {
            let cut = i + c.len_utf8();
            (&partial[..cut], &partial[cut..])
        },
        None => ("", partial),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hacklab_vfs::{AbsolutePath, FileMeta};

    fn p(s: &str) -> AbsolutePath {
        s.parse().unwrap()
    }

    /// `/home/user` holds `notes.txt` and `downloads/`; `/etc` holds
    /// `passwd`.
    fn setup() -> (SessionState, Vfs) {
        let mut vfs = Vfs::new();
        vfs.create_dir(&p("/"), "home").unwrap();
        vfs.create_dir(&p("/home"), "user").unwrap();
        vfs.create_file(&p("/home/user"), "notes.txt", "", FileMeta::default())
            .unwrap();
        vfs.create_dir(&p("/home/user"), "downloads").unwrap();
        vfs.create_dir(&p("/"), "etc").unwrap();
        vfs.create_file(&p("/etc"), "passwd", "", FileMeta::default())
            .unwrap();
        (SessionState::new("user"), vfs)
    }

    fn texts(candidates: &[CompletionCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn first_token_completes_command_names() {
        let (session, vfs) = setup();
        assert_eq!(texts(&complete("c", &session, &vfs)), vec!["cat", "cd", "clear"]);
    }

    #[test]
    fn empty_line_offers_all_commands() {
        let (session, vfs) = setup();
        assert_eq!(
            complete("", &session, &vfs).len(),
            registry::COMMANDS.len()
        );
    }

    #[test]
    fn argument_token_completes_paths() {
        let (session, vfs) = setup();
        let candidates = complete("cat down", &session, &vfs);
        assert_eq!(texts(&candidates), vec!["downloads"]);
        assert!(candidates[0].is_directory);
    }

    #[test]
    fn first_token_with_separator_completes_paths() {
        let (session, vfs) = setup();
        let candidates = complete("/et", &session, &vfs);
        assert_eq!(texts(&candidates), vec!["etc"]);
    }

    #[test]
    fn trailing_separator_lists_directory() {
        let (session, vfs) = setup();
        let candidates = complete("ls downloads/", &session, &vfs);
        assert!(candidates.is_empty());
        let candidates = complete("ls /etc/", &session, &vfs);
        assert_eq!(texts(&candidates), vec!["passwd"]);
    }

    #[test]
    fn trailing_whitespace_offers_cwd_children() {
        let (session, vfs) = setup();
        let candidates = complete("cat ", &session, &vfs);
        assert_eq!(texts(&candidates), vec!["downloads", "notes.txt"]);
    }

    #[test]
    fn unresolvable_directory_degrades_to_empty() {
        let (session, vfs) = setup();
        assert!(complete("cat /ghost/pre", &session, &vfs).is_empty());
        assert!(complete("cat notes.txt/pre", &session, &vfs).is_empty());
    }

    #[test]
    fn prefix_filter_is_case_sensitive() {
        let (session, vfs) = setup();
        assert!(complete("cat NOTES", &session, &vfs).is_empty());
    }

    #[test]
    fn directories_rank_before_files_on_equal_names() {
        // Candidates are unique per directory, so the tie-break only shows
        // through ordering stability: equal prefixes sort by name first.
        let (session, mut vfs) = setup();
        vfs.create_file(&p("/home/user"), "downloads.bak", "", FileMeta::default())
            .unwrap();
        let candidates = complete("ls down", &session, &vfs);
        assert_eq!(texts(&candidates), vec!["downloads", "downloads.bak"]);
        assert!(candidates[0].is_directory);
        assert!(!candidates[1].is_directory);
    }

    #[test]
    fn dotdot_in_directory_portion() {
        let (mut session, vfs) = setup();
        session.set_cwd(p("/home/user/downloads"));
        let candidates = complete("cat ../no", &session, &vfs);
        assert_eq!(texts(&candidates), vec!["notes.txt"]);
    }

    #[test]
    fn completion_never_mutates() {
        let (session, vfs) = setup();
        let vfs_before = vfs.clone();
        let cwd_before = session.cwd().clone();
        let _ = complete("cat down", &session, &vfs);
        let _ = complete("ls /etc/", &session, &vfs);
        assert_eq!(vfs, vfs_before);
        assert_eq!(session.cwd(), &cwd_before);
    }
}
