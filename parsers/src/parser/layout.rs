//! Column layout of `ps` output, derived from the invocation's arguments.
//!
//! `ps` prints whichever columns its format specifier asks for, in that
//! order. The same [`PsLayout`] drives both positional extraction in the ps
//! parser and validation of declarative `ps` sources, so the two can never
//! disagree about what a given argument list produces.

use hostfacts_core::ParserDefinitionError;
use thiserror::Error;

use super::fields::{SplitPolicy, split_columns};

/// Meaning of one `ps` output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PsField {
    Pid,
    Ppid,
    Comm,
    User,
    RealUid,
    EffectiveUid,
    SavedUid,
    RealGid,
    EffectiveGid,
    SavedGid,
    Tty,
    Stat,
    Nice,
    Threads,
    CpuPercent,
    MemPercent,
    Rss,
    Vsz,
    CpuTime,
    /// Full command line with arguments; may contain spaces.
    CommandLine,
    /// A column the parser does not map (e.g. `stime`).
    Ignored(String),
}

impl PsField {
    /// Maps a `ps` format keyword (lowercase, no header/width suffix).
    ///
    /// # Examples
    ///
    /// ```
    /// use hostfacts_parsers::parser::layout::PsField;
    ///
    /// assert_eq!(PsField::from_keyword("uid"), PsField::EffectiveUid);
    /// assert_eq!(PsField::from_keyword("args"), PsField::CommandLine);
    /// assert_eq!(PsField::from_keyword("lstart"), PsField::Ignored("lstart".into()));
    /// ```
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "pid" | "tgid" => Self::Pid,
            "ppid" => Self::Ppid,
            "comm" | "ucomm" | "ucmd" => Self::Comm,
            "user" | "euser" | "uname" => Self::User,
            "ruid" => Self::RealUid,
            "uid" | "euid" => Self::EffectiveUid,
            "suid" => Self::SavedUid,
            "rgid" => Self::RealGid,
            "gid" | "egid" => Self::EffectiveGid,
            "sgid" => Self::SavedGid,
            "tty" | "tt" | "tname" => Self::Tty,
            "stat" | "state" | "s" => Self::Stat,
            "nice" | "ni" => Self::Nice,
            "thcount" | "nlwp" => Self::Threads,
            "pcpu" | "%cpu" | "c" => Self::CpuPercent,
            "pmem" | "%mem" => Self::MemPercent,
            "rss" | "rssize" | "rsz" => Self::Rss,
            "vsz" | "vsize" => Self::Vsz,
            "time" | "cputime" | "bsdtime" => Self::CpuTime,
            "cmd" | "command" | "args" => Self::CommandLine,
            other => Self::Ignored(other.to_string()),
        }
    }

    pub fn is_command_line(&self) -> bool {
        matches!(self, Self::CommandLine)
    }
}

/// One named column of a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutField {
    /// Keyword as written in the specifier, normalized to lowercase
    pub keyword: String,
    pub field: PsField,
}

impl LayoutField {
    fn new(keyword: &str) -> Self {
        let keyword = keyword.to_ascii_lowercase();
        let field = PsField::from_keyword(&keyword);
        Self { keyword, field }
    }
}

/// Ordered columns a `ps` invocation prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsLayout {
    fields: Vec<LayoutField>,
    explicit: bool,
    has_header: bool,
}

/// `ps -ef`: UID PID PPID C STIME TTY TIME CMD
const FULL_FORMAT: [&str; 8] = ["user", "pid", "ppid", "c", "stime", "tty", "time", "cmd"];

/// `ps aux`: USER PID %CPU %MEM VSZ RSS TTY STAT START TIME COMMAND
const BSD_USER_FORMAT: [&str; 11] = [
    "user", "pid", "%cpu", "%mem", "vsz", "rss", "tty", "stat", "start", "time", "command",
];

impl PsLayout {
    /// Derives the layout from a `ps` argument list.
    ///
    /// A format specifier is the value of `-o` (alone, attached, or ending an
    /// option cluster such as `-ewwo` or BSD `axo`), of `--format`, or any free
    /// argument containing a comma. Values of options such as `-u`, `-U`, `-p`
    /// or `--user` are skipped. Without a specifier, BSD clusters carrying `u`
    /// (`aux`) get the user layout and everything else gets the `-f` full
    /// layout.
    ///
    /// # Examples
    ///
    /// ```
    /// use hostfacts_parsers::parser::layout::{PsField, PsLayout};
    ///
    /// let layout = PsLayout::from_args(&["h", "-ewwo", "pid,ppid,uid,comm,cmd"]);
    /// assert!(layout.is_explicit());
    /// assert!(!layout.has_header());
    /// assert_eq!(layout.len(), 5);
    /// assert_eq!(layout.fields()[2].field, PsField::EffectiveUid);
    ///
    /// let layout = PsLayout::from_args(&["-ef"]);
    /// assert!(!layout.is_explicit());
    /// assert!(layout.has_header());
    /// assert_eq!(layout.fields()[3].field, PsField::CpuPercent);
    ///
    /// // `hugo` belongs to `-u`; it is not a BSD `u` cluster.
    /// let layout = PsLayout::from_args(&["-f", "-u", "hugo"]);
    /// assert_eq!(layout.len(), 8);
    /// ```
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        let scan = scan_args(args);
        let has_header = !scan.no_header;

        if !scan.specifiers.is_empty() {
            let fields = scan
                .specifiers
                .into_iter()
                .flat_map(|spec| {
                    split_columns(spec, &SplitPolicy::Delimiter(','))
                        .iter()
                        .collect::<Vec<_>>()
                })
                .flat_map(str::split_whitespace)
                .filter_map(strip_keyword_suffix)
                .map(LayoutField::new)
                .collect();
            return Self {
                fields,
                explicit: true,
                has_header,
            };
        }

        let keywords: &[&str] = if scan.bsd_user {
            &BSD_USER_FORMAT
        } else {
            &FULL_FORMAT
        };
        Self {
            fields: keywords.iter().copied().map(LayoutField::new).collect(),
            explicit: false,
            has_header,
        }
    }

    pub fn fields(&self) -> &[LayoutField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `true` when the columns came from a format specifier.
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    /// `true` when the first output line is a column header.
    pub fn has_header(&self) -> bool {
        self.has_header
    }

    /// Lists every rule this layout breaks.
    ///
    /// 1. each field is named at most once;
    /// 2. the command-line field, when present, is the last field, since its
    ///    value contains spaces and would swallow any column after it;
    /// 3. a `pid` field is present, as every process record is keyed by it.
    pub fn problems(&self) -> Vec<LayoutDefect> {
        let mut problems = Vec::new();

        for (idx, entry) in self.fields.iter().enumerate() {
            let repeated = self.fields[..idx]
                .iter()
                .any(|earlier| earlier.field == entry.field);
            let reported = problems.iter().any(
                |problem| matches!(problem, LayoutDefect::DuplicateField(field) if *field == entry.keyword),
            );
            if repeated && !reported {
                problems.push(LayoutDefect::DuplicateField(entry.keyword.clone()));
            }
        }

        if let Some(idx) = self.fields.iter().position(|entry| entry.field.is_command_line()) {
            if idx + 1 != self.fields.len() {
                problems.push(LayoutDefect::CommandLineNotLast(
                    self.fields[idx].keyword.clone(),
                ));
            }
        }

        if !self.fields.iter().any(|entry| entry.field == PsField::Pid) {
            problems.push(LayoutDefect::MissingPid);
        }

        problems
    }

    /// [`problems`](Self::problems) attributed to the source `source_name`.
    pub fn defects(&self, source_name: &str) -> Vec<ParserDefinitionError> {
        self.problems()
            .into_iter()
            .map(|problem| problem.for_source(source_name))
            .collect()
    }

    /// Returns the first defect, if any.
    pub fn check(&self, source_name: &str) -> Result<(), ParserDefinitionError> {
        match self.defects(source_name).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// A rule a [`PsLayout`] breaks, independent of any declarative source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutDefect {
    #[error("output field `{0}` is named more than once")]
    DuplicateField(String),
    #[error("command-line field `{0}` must be the last output field")]
    CommandLineNotLast(String),
    #[error("output fields do not include `pid`")]
    MissingPid,
}

impl LayoutDefect {
    pub fn for_source(self, source_name: &str) -> ParserDefinitionError {
        let source_name = source_name.to_string();
        match self {
            Self::DuplicateField(field) => {
                ParserDefinitionError::DuplicateField { source_name, field }
            }
            Self::CommandLineNotLast(field) => {
                ParserDefinitionError::CommandLineNotLast { source_name, field }
            }
            Self::MissingPid => ParserDefinitionError::MissingField {
                source_name,
                field: "pid".to_string(),
            },
        }
    }
}

/// UNIX options whose value is the next argument or the rest of the cluster.
const UNIX_VALUE_OPTIONS: &str = "CGOgpqstuU";

/// BSD options whose value is the next argument or the rest of the cluster.
const BSD_VALUE_OPTIONS: &str = "OUkpqt";

/// BSD letters that take no value. `u` selects the user layout, `h` drops
/// the header.
const BSD_FLAGS: &str = "LSTVXacefghjlmnrsuvwx";

/// Long options taking a value when written without `=`.
const LONG_VALUE_OPTIONS: [&str; 14] = [
    "user", "User", "group", "Group", "pid", "ppid", "sid", "tty", "cols", "columns", "width",
    "rows", "lines", "sort",
];

const NO_HEADER_OPTIONS: [&str; 4] = ["no-headers", "no-heading", "noheaders", "noheading"];

/// What the arguments of one `ps` invocation select.
#[derive(Debug, Default)]
struct ArgScan<'a> {
    specifiers: Vec<&'a str>,
    bsd_user: bool,
    no_header: bool,
}

/// Role of the next argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Nothing,
    Format,
    Value,
}

impl<'a> ArgScan<'a> {
    /// Walks an option cluster left to right. An option taking a value ends
    /// the cluster: the rest of it is the value, or the next argument is when
    /// nothing is left.
    fn cluster(&mut self, cluster: &'a str, value_options: &str, bsd: bool) -> Pending {
        for (idx, ch) in cluster.char_indices() {
            let rest = &cluster[idx + ch.len_utf8()..];
            if ch == 'o' {
                if rest.is_empty() {
                    return Pending::Format;
                }
                self.specifiers.push(rest);
                return Pending::Nothing;
            }
            if value_options.contains(ch) {
                return if rest.is_empty() {
                    Pending::Value
                } else {
                    Pending::Nothing
                };
            }
            if bsd {
                match ch {
                    'u' => self.bsd_user = true,
                    'h' => self.no_header = true,
                    _ => {}
                }
            }
        }
        Pending::Nothing
    }
}

fn scan_args<S: AsRef<str>>(args: &[S]) -> ArgScan<'_> {
    let mut scan = ArgScan::default();
    let mut pending = Pending::Nothing;

    for arg in args {
        let arg: &str = arg.as_ref();
        match std::mem::replace(&mut pending, Pending::Nothing) {
            Pending::Format => {
                scan.specifiers.push(arg);
                continue;
            }
            Pending::Value => continue,
            Pending::Nothing => {}
        }

        if let Some(long) = arg.strip_prefix("--") {
            let (name, value) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };
            match (name, value) {
                ("format", Some(value)) => scan.specifiers.push(value),
                ("format", None) => pending = Pending::Format,
                (name, _) if NO_HEADER_OPTIONS.contains(&name) => scan.no_header = true,
                (name, None) if LONG_VALUE_OPTIONS.contains(&name) => pending = Pending::Value,
                _ => {}
            }
        } else if let Some(cluster) = arg.strip_prefix('-') {
            pending = scan.cluster(cluster, UNIX_VALUE_OPTIONS, false);
        } else if is_bsd_cluster(arg) {
            pending = scan.cluster(arg, BSD_VALUE_OPTIONS, true);
        } else if arg.contains(',') {
            scan.specifiers.push(arg);
        }
    }

    scan
}

/// A dashless argument made only of BSD option letters (`aux`, `h`, `axo`).
fn is_bsd_cluster(arg: &str) -> bool {
    !arg.is_empty()
        && arg
            .chars()
            .all(|ch| ch == 'o' || BSD_FLAGS.contains(ch) || BSD_VALUE_OPTIONS.contains(ch))
}

/// Drops `=HEADER` and `:WIDTH` suffixes from a format keyword.
fn strip_keyword_suffix(token: &str) -> Option<&str> {
    let keyword = token
        .split(['=', ':'])
        .next()
        .unwrap_or_default()
        .trim();
    Some(keyword).filter(|keyword| !keyword.is_empty())
}
