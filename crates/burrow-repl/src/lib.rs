//! burrow REPL, a line-oriented file browser.
//!
//! Plays the presentation role for the engine: renders listings, turns
//! names into the selection, asks before deleting and reports background
//! jobs as they finish.

pub mod opener;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use tokio::runtime::Runtime;

use burrow_kernel::path_util::{self, format_modified, format_size};
use burrow_kernel::vfs::{Filesystem, LocalFs};
use burrow_kernel::{
    Completion, Entry, Explorer, ExplorerConfig, OpenOutcome, Opener, Snapshot, SortKey,
};

pub use opener::SystemOpener;

/// REPL state: the explorer plus everything only the front end cares about.
pub struct Repl {
    runtime: Runtime,
    explorer: Explorer,
    /// Column sort for `ls`; `None` keeps the canonical order.
    sort: Option<(SortKey, bool)>,
    /// Paths waiting for a yes/no answer before deletion.
    pending_delete: Option<Vec<PathBuf>>,
    quit: bool,
}

impl Repl {
    /// Start at the configured directory.
    pub fn new(
        config: ExplorerConfig,
        fs: Arc<dyn Filesystem>,
        opener: Arc<dyn Opener>,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("burrow-worker")
            .enable_all()
            .build()
            .context("Failed to start runtime")?;
        let explorer = runtime
            .block_on(Explorer::start(config, fs, opener))
            .context("Failed to open start directory")?;
        Ok(Self {
            runtime,
            explorer,
            sort: None,
            pending_delete: None,
            quit: false,
        })
    }

    pub fn prompt(&self) -> String {
        if self.pending_delete.is_some() {
            return "[y/N] ".to_string();
        }
        format!("burrow:{}> ", self.explorer.current_path().display())
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn explorer(&self) -> &Explorer {
        &self.explorer
    }

    /// Notices for background jobs that finished since the last call.
    pub fn drain_notices(&mut self) -> Vec<String> {
        let done = self.runtime.block_on(self.explorer.pump());
        done.iter().map(format_completion).collect()
    }

    /// Wait for outstanding jobs, then stop the worker.
    pub fn shutdown(&mut self) -> Vec<String> {
        let done = self.runtime.block_on(self.explorer.shutdown());
        done.iter().map(format_completion).collect()
    }

    /// Process a single line of input.
    pub fn process_line(&mut self, line: &str) -> Result<Option<String>> {
        if let Some(paths) = self.pending_delete.take() {
            return self.answer_delete(line.trim(), paths);
        }

        let args = split_args(line);
        let Some((command, rest)) = args.split_first() else {
            return Ok(None);
        };
        let rest: Vec<&str> = rest.iter().map(String::as_str).collect();

        match command.as_str() {
            "ls" | "l" => self.ls(&rest),
            "cd" => {
                let target = rest.first().copied().unwrap_or("~");
                self.runtime.block_on(self.explorer.navigate_to(target))?;
                Ok(None)
            }
            "back" | "b" => self.step(Step::Back),
            "fwd" | "forward" | "f" => self.step(Step::Forward),
            "up" | ".." => self.step(Step::Up),
            "pwd" => Ok(Some(self.explorer.current_path().display().to_string())),
            "hist" => Ok(Some(self.render_history())),
            "open" | "o" => self.open(&rest),
            "refresh" | "r" => {
                self.runtime.block_on(self.explorer.refresh())?;
                Ok(None)
            }
            "sel" => self.select(&rest),
            "unsel" => {
                self.explorer.clear_selection();
                Ok(None)
            }
            "copy" | "cp" => {
                self.select_if_named(&rest);
                let n = self.explorer.copy_selected()?;
                Ok(Some(format!("{n} item(s) staged for copy")))
            }
            "cut" | "mv" => {
                self.select_if_named(&rest);
                let n = self.explorer.cut_selected()?;
                Ok(Some(format!("{n} item(s) staged for move")))
            }
            "paste" | "p" => {
                let id = self.runtime.block_on(self.explorer.paste())?;
                Ok(Some(format!("[job {id}] queued")))
            }
            "rm" | "del" => self.ask_delete(&rest),
            "rename" => {
                let [old, new] = rest.as_slice() else {
                    bail!("usage: rename <name> <new-name>");
                };
                let path = self.resolve(old);
                self.explorer.set_selection([path]);
                let renamed = self.runtime.block_on(self.explorer.rename_selected(new))?;
                Ok(Some(format!("renamed to {}", renamed.display())))
            }
            "mkdir" => {
                let name = rest.join(" ");
                let path = self.runtime.block_on(self.explorer.create_folder(&name))?;
                Ok(Some(format!("created {}", path.display())))
            }
            "touch" => {
                let name = rest.join(" ");
                let path = self.runtime.block_on(self.explorer.create_file(&name))?;
                Ok(Some(format!("created {}", path.display())))
            }
            "stat" | "props" => {
                let Some(name) = rest.first() else {
                    bail!("usage: stat <name>");
                };
                let path = self.resolve(name);
                let entry = self.runtime.block_on(self.explorer.properties(&path))?;
                Ok(Some(render_properties(&entry)))
            }
            "sort" => self.set_sort(&rest),
            "jobs" => Ok(Some(self.render_jobs())),
            "wait" => {
                let done = self.runtime.block_on(self.explorer.settle());
                let lines: Vec<String> = done.iter().map(format_completion).collect();
                Ok((!lines.is_empty()).then(|| lines.join("\n")))
            }
            "help" | "?" => Ok(Some(HELP_TEXT.to_string())),
            "quit" | "q" | "exit" => {
                self.quit = true;
                Ok(None)
            }
            other => bail!("unknown command: {other} (type help)"),
        }
    }

    fn ls(&self, flags: &[&str]) -> Result<Option<String>> {
        let snapshot = self.view();
        if flags.contains(&"-j") {
            let json = serde_json::to_string_pretty(snapshot.entries())
                .context("Failed to encode listing")?;
            return Ok(Some(json));
        }

        let long = flags.contains(&"-l");
        let mut out = String::new();
        for entry in snapshot.iter() {
            let marker = if self.explorer.selection().contains(&entry.path) {
                "*"
            } else {
                " "
            };
            if long {
                out.push_str(&format!("{marker}{}\n", render_long(entry)));
            } else if entry.is_dir {
                out.push_str(&format!("{marker}{}/\n", entry.name));
            } else {
                out.push_str(&format!("{marker}{}\n", entry.name));
            }
        }
        let (files, folders) = snapshot.counts();
        out.push_str(&format!("{folders} folder(s), {files} file(s)"));
        Ok(Some(out))
    }

    fn view(&self) -> Snapshot {
        match self.sort {
            Some((key, reverse)) => self.explorer.snapshot().sorted_by(key, reverse),
            None => self.explorer.snapshot().clone(),
        }
    }

    fn step(&mut self, step: Step) -> Result<Option<String>> {
        let explorer = &mut self.explorer;
        let moved = self.runtime.block_on(async move {
            match step {
                Step::Back => explorer.back().await,
                Step::Forward => explorer.forward().await,
                Step::Up => explorer.up().await,
            }
        })?;
        match moved {
            Some(_) => Ok(None),
            None => Ok(Some(format!("cannot go {}", step.label()))),
        }
    }

    fn open(&mut self, names: &[&str]) -> Result<Option<String>> {
        self.select_if_named(names);
        let outcome = self.runtime.block_on(self.explorer.open_selected())?;
        Ok(match outcome {
            OpenOutcome::Navigated(_) => None,
            OpenOutcome::Launched(path) => Some(format!("opened {}", path.display())),
            OpenOutcome::LaunchFailed { path, message } => {
                Some(format!("could not open {}: {message}", path.display()))
            }
        })
    }

    fn select(&mut self, names: &[&str]) -> Result<Option<String>> {
        if names == ["*"] {
            let all: Vec<PathBuf> = self.explorer.snapshot().iter().map(|e| e.path.clone()).collect();
            self.explorer.set_selection(all);
        } else if !names.is_empty() {
            let paths: Vec<PathBuf> = names.iter().map(|n| self.resolve(n)).collect();
            self.explorer.set_selection(paths);
        }
        let selection = self.explorer.selection();
        if selection.is_empty() {
            return Ok(Some("(nothing selected)".to_string()));
        }
        let lines: Vec<String> = selection.iter().map(|p| p.display().to_string()).collect();
        Ok(Some(lines.join("\n")))
    }

    fn select_if_named(&mut self, names: &[&str]) {
        if !names.is_empty() {
            let paths: Vec<PathBuf> = names.iter().map(|n| self.resolve(n)).collect();
            self.explorer.set_selection(paths);
        }
    }

    fn ask_delete(&mut self, names: &[&str]) -> Result<Option<String>> {
        self.select_if_named(names);
        let paths = self.explorer.selection().to_vec();
        if paths.is_empty() {
            bail!("nothing selected");
        }
        let question = match paths.as_slice() {
            [one] => format!("delete {}?", one.display()),
            many => format!("delete {} items?", many.len()),
        };
        self.pending_delete = Some(paths);
        Ok(Some(question))
    }

    fn answer_delete(&mut self, answer: &str, paths: Vec<PathBuf>) -> Result<Option<String>> {
        if !matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes") {
            return Ok(Some("cancelled".to_string()));
        }
        self.explorer.set_selection(paths);
        let id = self.runtime.block_on(self.explorer.delete_selected())?;
        Ok(Some(format!("[job {id}] queued")))
    }

    fn set_sort(&mut self, args: &[&str]) -> Result<Option<String>> {
        let reverse = args.contains(&"-r");
        let key = args.iter().find(|a| !a.starts_with('-'));
        match key {
            None => {
                self.sort = None;
                Ok(Some("sort: default".to_string()))
            }
            Some(key) => {
                let key: SortKey = key
                    .parse()
                    .map_err(|e| anyhow::anyhow!("{e}"))
                    .context("usage: sort [name|size|modified] [-r]")?;
                self.sort = Some((key, reverse));
                Ok(Some(format!(
                    "sort: {key:?}{}",
                    if reverse { " (reversed)" } else { "" }
                )))
            }
        }
    }

    fn render_history(&self) -> String {
        let history = self.explorer.history();
        let mut lines = Vec::with_capacity(history.len());
        for (i, path) in history.entries().iter().enumerate() {
            let marker = if i == history.cursor() { ">" } else { " " };
            lines.push(format!("{marker} {}", path.display()));
        }
        lines.join("\n")
    }

    fn render_jobs(&self) -> String {
        let jobs = self.runtime.block_on(self.explorer.jobs());
        if jobs.is_empty() {
            return "(no jobs)".to_string();
        }
        jobs.iter()
            .map(|job| format!("{:>3}  {:<10} {}", job.id.to_string(), job.status.to_string(), job.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn resolve(&self, name: &str) -> PathBuf {
        let home = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf());
        path_util::resolve_input(self.explorer.current_path(), name, home.as_deref())
    }
}

#[derive(Clone, Copy)]
enum Step {
    Back,
    Forward,
    Up,
}

impl Step {
    fn label(self) -> &'static str {
        match self {
            Step::Back => "back",
            Step::Forward => "forward",
            Step::Up => "up",
        }
    }
}

/// Split a line on whitespace, honouring single and double quotes.
fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_arg = false;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_arg = true;
            }
            None if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            None => {
                current.push(c);
                in_arg = true;
            }
        }
    }
    if in_arg {
        args.push(current);
    }
    args
}

fn render_long(entry: &Entry) -> String {
    let kind = if entry.is_dir { "dir" } else { "file" };
    let size = if entry.is_dir {
        "-".to_string()
    } else {
        format_size(entry.size)
    };
    let modified = entry
        .modified
        .map(format_modified)
        .unwrap_or_else(|| "-".to_string());
    format!("{kind:<4} {size:>10}  {modified:<16}  {}", entry.name)
}

fn render_properties(entry: &Entry) -> String {
    let kind = if entry.is_dir { "folder" } else { "file" };
    let mut out = format!("name:     {}\nkind:     {kind}\npath:     {}", entry.name, entry.path.display());
    if !entry.is_dir {
        out.push_str(&format!("\nsize:     {} ({} bytes)", format_size(entry.size), entry.size));
    }
    if let Some(modified) = entry.modified {
        out.push_str(&format!("\nmodified: {}", format_modified(modified)));
    }
    out
}

fn format_completion(completion: &Completion) -> String {
    let mut out = format!(
        "[job {}] {}: {}",
        completion.job,
        completion.status(),
        completion.result.summary()
    );
    for failure in &completion.result.failures {
        out.push_str(&format!("\n  ! {failure}"));
    }
    out
}

const HELP_TEXT: &str = r#"burrow: file browser

Navigation:
  ls [-l] [-j]        List the current folder (long / JSON)
  cd <path>           Go to a folder (relative, absolute or ~)
  back, fwd, up       Move through history / to the parent
  hist                Show history
  pwd                 Print the current folder
  refresh             Re-read the current folder
  sort [key] [-r]     Sort ls by name, size or modified; no key resets

Selection:
  sel <names..>       Select entries (sel * selects everything)
  sel                 Show the selection
  unsel               Clear the selection
  open [name]         Open a folder or launch a file

Commands:
  copy [names..]      Stage for copying
  cut [names..]       Stage for moving
  paste               Paste into the current folder (background)
  rm [names..]        Delete, after confirmation (background)
  rename <old> <new>  Rename an entry
  mkdir <name>        Create a folder
  touch <name>        Create an empty file
  stat <name>         Show properties
  jobs                List background jobs
  wait                Wait for background jobs

  help                Show this help
  quit                Exit
"#;

/// Run the REPL against the host filesystem.
pub fn run() -> Result<()> {
    let config = ExplorerConfig::load()?;
    let fs: Arc<dyn Filesystem> = Arc::new(LocalFs::default());
    let mut repl = Repl::new(config, fs, Arc::new(SystemOpener))?;

    println!("burrow v{}", env!("CARGO_PKG_VERSION"));
    println!("Type help for commands, quit to exit.\n");

    let mut rl: Editor<(), DefaultHistory> = Editor::new().context("Failed to create editor")?;

    let history_path = directories::BaseDirs::new()
        .map(|d| d.data_dir().join("burrow").join("history.txt"));
    if let Some(ref path) = history_path {
        // Explicitly ignored: a missing history file is normal on first run
        let _ = rl.load_history(path);
    }

    loop {
        for notice in repl.drain_notices() {
            println!("{notice}");
        }

        match rl.readline(&repl.prompt()) {
            Ok(line) => {
                // Explicitly ignored: history is a convenience
                let _ = rl.add_history_entry(line.as_str());

                match repl.process_line(&line) {
                    Ok(Some(output)) => println!("{output}"),
                    Ok(None) => {}
                    Err(e) => eprintln!("Error: {e:#}"),
                }
                if repl.should_quit() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    for notice in repl.shutdown() {
        println!("{notice}");
    }

    if let Some(ref path) = history_path {
        if let Some(parent) = path.parent() {
            // Explicitly ignored: failing to save history is not fatal
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = rl.save_history(path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_args_honours_quotes() {
        assert_eq!(split_args("rename a.txt b.txt"), vec!["rename", "a.txt", "b.txt"]);
        assert_eq!(
            split_args("mkdir \"my folder\""),
            vec!["mkdir", "my folder"]
        );
        assert_eq!(split_args("sel 'it''s' x"), vec!["sel", "its", "x"]);
        assert_eq!(split_args("touch \"\""), vec!["touch", ""]);
        assert!(split_args("   ").is_empty());
    }

    #[test]
    fn long_rendering_has_columns() {
        let entry = Entry::file("b.txt", "/x/b.txt", 1536);
        let line = render_long(&entry);
        assert!(line.starts_with("file"));
        assert!(line.contains("1.5 KB"));
        assert!(line.ends_with("b.txt"));
    }
}
