//! Handlers for the built-in commands.

use hacklab_types::{Result, SimError};
use hacklab_vfs::{AbsolutePath, EntryKind, FileMeta, Vfs, resolve};

use crate::interpreter::CommandOutput;
use crate::registry::{self, Builtin};
use crate::session::SessionState;

/// Maximum recursion depth for tree traversal to prevent stack overflow.
const MAX_DEPTH: usize = 64;

pub(crate) fn dispatch(
    builtin: Builtin,
    args: &[&str],
    session: &mut SessionState,
    vfs: &mut Vfs,
) -> Result<CommandOutput> {
    match builtin {
        Builtin::Cat => cat(args, session, vfs),
        Builtin::Cd => cd(args, session, vfs),
        Builtin::Clear => Ok(CommandOutput::Clear),
        Builtin::Echo => Ok(CommandOutput::Text(args.join(" "))),
        Builtin::Env => env(session),
        Builtin::Find => find(args, session, vfs),
        Builtin::Grep => grep(args, session, vfs),
        Builtin::Help => help(args),
        Builtin::History => history(session),
        Builtin::Ls => ls(args, session, vfs),
        Builtin::Mkdir => mkdir(args, session, vfs),
        Builtin::Pwd => Ok(CommandOutput::Text(session.cwd().to_string())),
        Builtin::Reset => Ok(CommandOutput::Reset),
        Builtin::Touch => touch(args, session, vfs),
        Builtin::Whoami => Ok(CommandOutput::Text(session.user().to_string())),
    }
}

// ---------------------------------------------------------------------------
// cd
// ---------------------------------------------------------------------------

fn cd(args: &[&str], session: &mut SessionState, vfs: &Vfs) -> Result<CommandOutput> {
    let target = match args.first() {
        Some(input) => resolve(session.cwd(), input)?,
        None => session.home(),
    };
    let meta = vfs.stat(&target)?;
    if meta.kind != EntryKind::Directory {
        return Err(SimError::NotADirectory(target.to_string()));
    }
    session.set_cwd(target);
    Ok(CommandOutput::None)
}

// ---------------------------------------------------------------------------
// ls
// ---------------------------------------------------------------------------

fn ls(args: &[&str], session: &SessionState, vfs: &Vfs) -> Result<CommandOutput> {
    let path = match args.first() {
        Some(input) => resolve(session.cwd(), input)?,
        None => session.cwd().clone(),
    };
    let entries = vfs.list(&path)?;
    if entries.is_empty() {
        return Ok(CommandOutput::Text("(empty)".to_string()));
    }
    let mut lines = Vec::new();
    for e in &entries {
        let suffix = if e.is_directory() { "/" } else { "" };
        lines.push(format!("{}{suffix}", e.name));
    }
    Ok(CommandOutput::Text(lines.join("\n")))
}

// ---------------------------------------------------------------------------
// cat
// ---------------------------------------------------------------------------

fn cat(args: &[&str], session: &SessionState, vfs: &Vfs) -> Result<CommandOutput> {
    let path = resolve(session.cwd(), args[0])?;
    let content = vfs.read_file(&path)?;
    Ok(CommandOutput::Text(content.to_string()))
}

// ---------------------------------------------------------------------------
// mkdir
// ---------------------------------------------------------------------------

fn mkdir(args: &[&str], session: &SessionState, vfs: &mut Vfs) -> Result<CommandOutput> {
    let path = resolve(session.cwd(), args[0])?;
    let Some(name) = path.file_name() else {
        return Err(SimError::AlreadyExists(path.to_string()));
    };
    vfs.create_dir(&path.parent(), name)?;
    Ok(CommandOutput::None)
}

// ---------------------------------------------------------------------------
// touch
// ---------------------------------------------------------------------------

fn touch(args: &[&str], session: &SessionState, vfs: &mut Vfs) -> Result<CommandOutput> {
    let path = resolve(session.cwd(), args[0])?;
    if vfs.exists(&path) {
        // Matches touch on a real shell: an existing entry is left alone.
        return Ok(CommandOutput::None);
    }
    let Some(name) = path.file_name() else {
        return Ok(CommandOutput::None);
    };
    vfs.create_file(&path.parent(), name, "", FileMeta::default())?;
    Ok(CommandOutput::None)
}

// ---------------------------------------------------------------------------
// find
// ---------------------------------------------------------------------------

fn find(args: &[&str], session: &SessionState, vfs: &Vfs) -> Result<CommandOutput> {
    let (root, pattern) = if args.len() == 1 {
        (session.cwd().clone(), args[0])
    } else {
        (resolve(session.cwd(), args[0])?, args[1])
    };
    let mut results = Vec::new();
    find_recursive(vfs, &root, pattern, &mut results, 0)?;
    if results.is_empty() {
        Ok(CommandOutput::Text("(no matches)".to_string()))
    } else {
        Ok(CommandOutput::Text(results.join("\n")))
    }
}

/// Depth-first walk, children in name order, collecting paths whose name
/// contains `pattern`.
fn find_recursive(
    vfs: &Vfs,
    dir: &AbsolutePath,
    pattern: &str,
    results: &mut Vec<String>,
    depth: usize,
) -> Result<()> {
    if depth >= MAX_DEPTH {
        return Ok(());
    }
    for entry in vfs.list(dir)? {
        let full = dir.join(&entry.name)?;
        if entry.name.contains(pattern) {
            results.push(full.to_string());
        }
        if entry.is_directory() {
            find_recursive(vfs, &full, pattern, results, depth + 1)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// grep
// ---------------------------------------------------------------------------

fn grep(args: &[&str], session: &SessionState, vfs: &Vfs) -> Result<CommandOutput> {
    let pattern = args[0];
    let target = match args.get(1) {
        Some(path) => resolve(session.cwd(), path)?,
        None => session.cwd().clone(),
    };

    let mut matches = Vec::new();
    let meta = vfs.stat(&target)?;
    match meta.kind {
        EntryKind::File => {
            let content = vfs.read_file(&target)?;
            for line in content.lines() {
                if line.contains(pattern) {
                    matches.push(line.to_string());
                }
            }
        },
        EntryKind::Directory => {
            grep_recursive(vfs, &target, pattern, &mut matches, 0)?;
        },
    }

    if matches.is_empty() {
        Ok(CommandOutput::Text("(no matches)".to_string()))
    } else {
        Ok(CommandOutput::Text(matches.join("\n")))
    }
}

/// Depth-first walk emitting `path:line` for each matching line, children
/// in name order.
fn grep_recursive(
    vfs: &Vfs,
    dir: &AbsolutePath,
    pattern: &str,
    matches: &mut Vec<String>,
    depth: usize,
) -> Result<()> {
    if depth >= MAX_DEPTH {
        return Ok(());
    }
    for entry in vfs.list(dir)? {
        let full = dir.join(&entry.name)?;
        match entry.kind {
            EntryKind::File => {
                let content = vfs.read_file(&full)?;
                for line in content.lines() {
                    if line.contains(pattern) {
                        matches.push(format!("{full}:{line}"));
                    }
                }
            },
            EntryKind::Directory => {
                grep_recursive(vfs, &full, pattern, matches, depth + 1)?;
            },
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// help / env / history
// ---------------------------------------------------------------------------

fn help(args: &[&str]) -> Result<CommandOutput> {
    if let Some(&name) = args.first() {
        let spec = registry::lookup(name)
            .ok_or_else(|| SimError::UnknownCommand(name.to_string()))?;
        let mut out = spec.name.to_string();
        out.push_str(&format!("\n  {}\n", spec.description));
        out.push_str(&format!("  Usage: {}", spec.usage));
        return Ok(CommandOutput::Text(out));
    }
    let mut out = format!("Commands ({}):\n", registry::COMMANDS.len());
    for spec in registry::COMMANDS {
        out.push_str(&format!("  {:10} {}\n", spec.name, spec.description));
    }
    out.push_str("\nType 'help <command>' for details.");
    Ok(CommandOutput::Text(out))
}

fn env(session: &SessionState) -> Result<CommandOutput> {
    let mut out = String::new();
    for (k, v) in session.vars() {
        out.push_str(&format!("{k}={v}\n"));
    }
    Ok(CommandOutput::Text(out.trim_end().to_string()))
}

fn history(session: &SessionState) -> Result<CommandOutput> {
    if session.history().is_empty() {
        return Ok(CommandOutput::Text("(no history)".to_string()));
    }
    let mut out = String::new();
    for (i, entry) in session.history().iter().enumerate() {
        out.push_str(&format!("  {:4}  {entry}\n", i + 1));
    }
    Ok(CommandOutput::Text(out.trim_end().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::execute;
    use hacklab_types::ErrorKind;
    use hacklab_vfs::FileKind;

    fn p(s: &str) -> AbsolutePath {
        s.parse().unwrap()
    }

    /// A small lab image:
    /// `/home/user/{notes.txt,downloads/wordlist.txt}`, `/etc/passwd`,
    /// `/root/flag.txt`.
    fn setup() -> (SessionState, Vfs) {
        let mut vfs = Vfs::new();
        vfs.create_dir(&p("/"), "home").unwrap();
        vfs.create_dir(&p("/home"), "user").unwrap();
        vfs.create_file(
            &p("/home/user"),
            "notes.txt",
            "target: 10.0.0.7\nssh port open",
            FileMeta::default(),
        )
        .unwrap();
        vfs.create_dir(&p("/home/user"), "downloads").unwrap();
        vfs.create_file(
            &p("/home/user/downloads"),
            "wordlist.txt",
            "admin\nletmein\nssh-keys",
            FileMeta::default(),
        )
        .unwrap();
        vfs.create_dir(&p("/"), "etc").unwrap();
        vfs.create_file(&p("/etc"), "passwd", "root:x:0:0\nuser:x:1000:1000", FileMeta::default())
            .unwrap();
        vfs.create_dir(&p("/"), "root").unwrap();
        vfs.create_file(
            &p("/root"),
            "flag.txt",
            "FLAG{grounded}",
            FileMeta { kind: FileKind::Flag },
        )
        .unwrap();
        (SessionState::new("user"), vfs)
    }

    fn run(line: &str, session: &mut SessionState, vfs: &mut Vfs) -> String {
        match execute(line, session, vfs).unwrap() {
            CommandOutput::Text(s) => s,
            CommandOutput::None => String::new(),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn ls_marks_directories() {
        let (mut session, mut vfs) = setup();
        let out = run("ls", &mut session, &mut vfs);
        assert_eq!(out, "downloads/\nnotes.txt");
    }

    #[test]
    fn ls_empty_directory() {
        let (mut session, mut vfs) = setup();
        run("mkdir staging", &mut session, &mut vfs);
        assert_eq!(run("ls staging", &mut session, &mut vfs), "(empty)");
    }

    #[test]
    fn ls_of_file_is_error() {
        let (mut session, mut vfs) = setup();
        let err = execute("ls notes.txt", &mut session, &mut vfs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotADirectory);
    }

    #[test]
    fn cat_directory_is_error() {
        let (mut session, mut vfs) = setup();
        let err = execute("cat downloads", &mut session, &mut vfs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IsADirectory);
    }

    #[test]
    fn cat_flag_reads_like_any_file() {
        let (mut session, mut vfs) = setup();
        assert_eq!(
            run("cat /root/flag.txt", &mut session, &mut vfs),
            "FLAG{grounded}"
        );
    }

    #[test]
    fn cd_into_file_is_error() {
        let (mut session, mut vfs) = setup();
        let err = execute("cd notes.txt", &mut session, &mut vfs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotADirectory);
    }

    #[test]
    fn cd_without_args_goes_home() {
        let (mut session, mut vfs) = setup();
        run("cd /etc", &mut session, &mut vfs);
        run("cd", &mut session, &mut vfs);
        assert_eq!(session.cwd().to_string(), "/home/user");
    }

    #[test]
    fn echo_joins_arguments() {
        let (mut session, mut vfs) = setup();
        assert_eq!(
            run("echo scanning 10.0.0.7 now", &mut session, &mut vfs),
            "scanning 10.0.0.7 now"
        );
    }

    #[test]
    fn whoami_reports_user() {
        let (mut session, mut vfs) = setup();
        assert_eq!(run("whoami", &mut session, &mut vfs), "user");
    }

    #[test]
    fn find_matches_names_depth_first() {
        let (mut session, mut vfs) = setup();
        let out = run("find / txt", &mut session, &mut vfs);
        assert_eq!(
            out,
            "/home/user/downloads/wordlist.txt\n/home/user/notes.txt\n/root/flag.txt"
        );
    }

    #[test]
    fn find_defaults_to_cwd() {
        let (mut session, mut vfs) = setup();
        let out = run("find notes", &mut session, &mut vfs);
        assert_eq!(out, "/home/user/notes.txt");
    }

    #[test]
    fn find_no_matches() {
        let (mut session, mut vfs) = setup();
        assert_eq!(run("find zzz", &mut session, &mut vfs), "(no matches)");
    }

    #[test]
    fn find_missing_root_is_error() {
        let (mut session, mut vfs) = setup();
        let err = execute("find /ghost txt", &mut session, &mut vfs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn grep_single_file_lines() {
        let (mut session, mut vfs) = setup();
        assert_eq!(
            run("grep port notes.txt", &mut session, &mut vfs),
            "ssh port open"
        );
    }

    #[test]
    fn grep_is_case_sensitive() {
        let (mut session, mut vfs) = setup();
        assert_eq!(
            run("grep PORT notes.txt", &mut session, &mut vfs),
            "(no matches)"
        );
    }

    #[test]
    fn grep_directory_prefixes_paths() {
        let (mut session, mut vfs) = setup();
        let out = run("grep ssh /home/user", &mut session, &mut vfs);
        assert_eq!(
            out,
            "/home/user/downloads/wordlist.txt:ssh-keys\n/home/user/notes.txt:ssh port open"
        );
    }

    #[test]
    fn grep_missing_target_is_error() {
        let (mut session, mut vfs) = setup();
        let err = execute("grep x /ghost", &mut session, &mut vfs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn mkdir_relative_and_absolute() {
        let (mut session, mut vfs) = setup();
        run("mkdir loot", &mut session, &mut vfs);
        run("mkdir /tmp", &mut session, &mut vfs);
        assert!(vfs.is_dir(&p("/home/user/loot")));
        assert!(vfs.is_dir(&p("/tmp")));
    }

    #[test]
    fn mkdir_root_already_exists() {
        let (mut session, mut vfs) = setup();
        let err = execute("mkdir /", &mut session, &mut vfs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn mkdir_under_missing_parent_is_error() {
        let (mut session, mut vfs) = setup();
        let err = execute("mkdir /ghost/child", &mut session, &mut vfs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn touch_creates_then_leaves_alone() {
        let (mut session, mut vfs) = setup();
        run("touch scan.log", &mut session, &mut vfs);
        assert_eq!(run("cat scan.log", &mut session, &mut vfs), "");
        // Touching again is a no-op, not an error.
        run("touch scan.log", &mut session, &mut vfs);
        run("touch notes.txt", &mut session, &mut vfs);
        assert_eq!(
            run("cat notes.txt", &mut session, &mut vfs),
            "target: 10.0.0.7\nssh port open"
        );
    }

    #[test]
    fn help_lists_all_commands() {
        let (mut session, mut vfs) = setup();
        let out = run("help", &mut session, &mut vfs);
        for spec in registry::COMMANDS {
            assert!(out.contains(spec.name), "help must mention {}", spec.name);
        }
    }

    #[test]
    fn help_for_one_command_shows_usage() {
        let (mut session, mut vfs) = setup();
        let out = run("help grep", &mut session, &mut vfs);
        assert!(out.contains("Usage: grep <pattern> [path]"));
    }

    #[test]
    fn help_for_unknown_command_is_error() {
        let (mut session, mut vfs) = setup();
        let err = execute("help warez", &mut session, &mut vfs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownCommand);
    }

    #[test]
    fn env_lists_sorted_variables() {
        let (mut session, mut vfs) = setup();
        let out = run("env", &mut session, &mut vfs);
        assert_eq!(out, "HOME=/home/user\nSHELL=/bin/labsh\nUSER=user");
    }

    #[test]
    fn history_numbers_lines() {
        let (mut session, mut vfs) = setup();
        run("pwd", &mut session, &mut vfs);
        run("ls", &mut session, &mut vfs);
        let out = run("history", &mut session, &mut vfs);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("pwd"));
        assert!(lines[2].contains("history"));
    }

    #[test]
    fn clear_and_reset_are_signals() {
        let (mut session, mut vfs) = setup();
        assert_eq!(
            execute("clear", &mut session, &mut vfs).unwrap(),
            CommandOutput::Clear
        );
        assert_eq!(
            execute("reset", &mut session, &mut vfs).unwrap(),
            CommandOutput::Reset
        );
    }
}
