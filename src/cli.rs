// Command dispatcher: maps a subcommand name to its flag set and calls the
// backend. Arguments come in as an explicit slice and output goes to an
// injected writer, so a whole invocation can be exercised in tests without
// touching process-wide state or the network.

use crate::api::{ApiClient, ApiError, ReminderBackend};
use crate::ui;
use anyhow::{bail, Context, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, Args, CommandFactory, FromArgMatches, Parser};
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

pub const DEFAULT_BACKEND: &str = "http://localhost:8000";

/// Top-level flags. Everything from the first positional on belongs to the
/// selected command and is handed to [`Switch::run`] untouched.
#[derive(Parser, Debug)]
#[command(name = "reminders-cli", version, about = "Reminders backend client")]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// Backend API URL to use
    #[arg(long, default_value = DEFAULT_BACKEND)]
    pub backend: String,

    /// Print response bodies verbatim instead of pretty JSON
    #[arg(long)]
    pub raw: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print usage
    #[arg(long)]
    pub help: bool,

    /// <command> [<args>]
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Title, message and duration, shared by create and edit.
#[derive(Args, Debug)]
struct ReminderFlags {
    /// Title of reminder
    #[arg(short = 't', long, default_value = "")]
    title: String,

    /// Message of reminder
    #[arg(short = 'm', long, default_value = "")]
    message: String,

    /// Duration of reminder, e.g. 90s, 10m, 1h30m
    #[arg(short = 'd', long, default_value = "10m", value_parser = parse_duration)]
    duration: Duration,
}

#[derive(Parser, Debug)]
#[command(args_override_self = true, disable_version_flag = true)]
struct CreateFlags {
    #[command(flatten)]
    reminder: ReminderFlags,
}

#[derive(Parser, Debug)]
#[command(args_override_self = true, disable_version_flag = true)]
struct EditFlags {
    /// ID of reminder (repeatable, the last one is edited)
    #[arg(long = "id", required = true)]
    ids: Vec<String>,

    #[command(flatten)]
    reminder: ReminderFlags,
}

/// Flags for fetch and delete.
#[derive(Parser, Debug)]
#[command(disable_version_flag = true)]
struct IdsFlags {
    /// ID of reminder (repeatable)
    #[arg(long = "id", required = true)]
    ids: Vec<String>,
}

#[derive(Parser, Debug)]
#[command(args_override_self = true, disable_version_flag = true)]
struct HealthFlags {
    /// Host to ping for health [default: the backend URL]
    #[arg(long)]
    host: Option<String>,
}

/// The fixed set of subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Create,
    Edit,
    Fetch,
    Delete,
    Health,
}

impl CommandKind {
    pub const ALL: [CommandKind; 5] = [
        CommandKind::Create,
        CommandKind::Edit,
        CommandKind::Fetch,
        CommandKind::Delete,
        CommandKind::Health,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Create => "create",
            CommandKind::Edit => "edit",
            CommandKind::Fetch => "fetch",
            CommandKind::Delete => "delete",
            CommandKind::Health => "health",
        }
    }

    /// Raw arguments required after the command name.
    pub fn min_args(self) -> usize {
        match self {
            CommandKind::Create => 3,
            CommandKind::Edit => 2,
            CommandKind::Fetch | CommandKind::Delete => 1,
            CommandKind::Health => 0,
        }
    }
}

/// Resolves and runs exactly one command per invocation.
pub struct Switch<C> {
    client: C,
    backend_url: String,
    raw: bool,
    commands: BTreeMap<&'static str, CommandKind>,
}

impl Switch<ApiClient> {
    /// Dispatcher backed by a real HTTP client for `backend_url`.
    pub fn new(backend_url: &str) -> Result<Self> {
        let client = ApiClient::new(backend_url)?;
        Ok(Switch::with_client(client, backend_url))
    }
}

impl<C: ReminderBackend> Switch<C> {
    pub fn with_client(client: C, backend_url: impl Into<String>) -> Self {
        let commands = CommandKind::ALL.iter().map(|k| (k.name(), *k)).collect();
        Switch {
            client,
            backend_url: backend_url.into(),
            raw: false,
            commands,
        }
    }

    /// Print response bodies verbatim.
    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    #[cfg(test)]
    fn client(&self) -> &C {
        &self.client
    }

    /// List every command with a pointer to its own `--help`.
    pub fn help(&self, program: &str, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "Usage of: {program}:\n <command> [<args>]")?;
        for name in self.commands.keys() {
            writeln!(out, "{name}\t --help ")?;
        }
        Ok(())
    }

    /// Run `args[0]` with the remaining arguments as its flags.
    pub fn run(&self, program: &str, args: &[String], out: &mut dyn Write) -> Result<()> {
        let Some((name, rest)) = args.split_first() else {
            bail!("no command given");
        };
        let Some(&kind) = self.commands.get(name.as_str()) else {
            bail!("command {name} not found");
        };
        tracing::debug!(command = name.as_str(), args = rest.len(), "dispatching");

        self.check_args(program, kind, rest, out)?;
        match kind {
            CommandKind::Create => self.create(program, rest, out),
            CommandKind::Edit => self.edit(program, rest, out),
            CommandKind::Fetch => self.fetch(program, rest, out),
            CommandKind::Delete => self.delete(program, rest, out),
            CommandKind::Health => self.health(program, rest, out),
        }
    }

    // Counts raw arguments, not parsed flags. A lone `--help` is left to the
    // flag parser.
    fn check_args(
        &self,
        program: &str,
        kind: CommandKind,
        rest: &[String],
        out: &mut dyn Write,
    ) -> Result<()> {
        if rest.len() == 1 && rest[0] == "--help" {
            return Ok(());
        }
        let min = kind.min_args();
        if rest.len() < min {
            let name = kind.name();
            writeln!(out, "incorrect use of {name}\n{program} {name} --help")?;
            bail!("{name} expects at least {min} arg(s), {} provided", rest.len());
        }
        Ok(())
    }

    /// Parse `rest` into `F`. `None` means help was requested and printed.
    fn parse_flags<F: Parser>(
        &self,
        program: &str,
        kind: CommandKind,
        rest: &[String],
        out: &mut dyn Write,
    ) -> Result<Option<F>> {
        let name = kind.name();
        let mut cmd = F::command().bin_name(format!("{program} {name}"));
        let argv = std::iter::once(name.to_string()).chain(rest.iter().cloned());
        match cmd.try_get_matches_from_mut(argv) {
            Ok(matches) => {
                let flags = F::from_arg_matches(&matches)
                    .with_context(|| format!("error parsing command {name} flags"))?;
                Ok(Some(flags))
            }
            Err(err) if err.kind() == ErrorKind::DisplayHelp => {
                write!(out, "{}", err.render())?;
                Ok(None)
            }
            Err(err) => Err(err).with_context(|| format!("error parsing command {name} flags")),
        }
    }

    fn create(&self, program: &str, rest: &[String], out: &mut dyn Write) -> Result<()> {
        let Some(flags) = self.parse_flags::<CreateFlags>(program, CommandKind::Create, rest, out)?
        else {
            return Ok(());
        };
        let r = flags.reminder;
        let res = ui::with_spinner("Creating reminder...", || {
            self.client.create(&r.title, &r.message, r.duration)
        });
        let body = surface(res, out).context("error creating reminder")?;
        writeln!(out, "Reminder created successfully")?;
        self.print_body(&body, out)
    }

    fn edit(&self, program: &str, rest: &[String], out: &mut dyn Write) -> Result<()> {
        let Some(flags) = self.parse_flags::<EditFlags>(program, CommandKind::Edit, rest, out)?
        else {
            return Ok(());
        };
        let Some(id) = flags.ids.last() else {
            bail!("edit needs an --id");
        };
        let r = flags.reminder;
        let res = ui::with_spinner("Editing reminder...", || {
            self.client.edit(id, &r.title, &r.message, r.duration)
        });
        let body = surface(res, out).context("error editing reminder")?;
        writeln!(out, "Reminder edited successfully")?;
        self.print_body(&body, out)
    }

    fn fetch(&self, program: &str, rest: &[String], out: &mut dyn Write) -> Result<()> {
        let Some(flags) = self.parse_flags::<IdsFlags>(program, CommandKind::Fetch, rest, out)?
        else {
            return Ok(());
        };
        let res = ui::with_spinner("Fetching reminders...", || self.client.fetch(&flags.ids));
        let body = surface(res, out).context("error fetching reminder(s)")?;
        writeln!(out, "Reminders fetched successfully")?;
        self.print_body(&body, out)
    }

    fn delete(&self, program: &str, rest: &[String], out: &mut dyn Write) -> Result<()> {
        let Some(flags) = self.parse_flags::<IdsFlags>(program, CommandKind::Delete, rest, out)?
        else {
            return Ok(());
        };
        let res = ui::with_spinner("Deleting reminders...", || self.client.delete(&flags.ids));
        surface(res, out).context("error deleting reminder(s)")?;
        writeln!(out, "Reminders deleted successfully\n{}", flags.ids.join(", "))?;
        Ok(())
    }

    fn health(&self, program: &str, rest: &[String], out: &mut dyn Write) -> Result<()> {
        let Some(flags) = self.parse_flags::<HealthFlags>(program, CommandKind::Health, rest, out)?
        else {
            return Ok(());
        };
        let host = flags.host.unwrap_or_else(|| self.backend_url.clone());
        writeln!(out, "Checking health of backend at: {host}")?;
        if !ui::with_spinner("Checking health...", || self.client.healthy(&host)) {
            bail!("backend not healthy");
        }
        writeln!(out, "Backend is healthy {host}")?;
        Ok(())
    }

    fn print_body(&self, body: &[u8], out: &mut dyn Write) -> Result<()> {
        let rendered = ui::render_body(body, self.raw);
        if !rendered.is_empty() {
            writeln!(out, "{rendered}")?;
        }
        Ok(())
    }
}

/// Show the server's explanation of a status mismatch before the error
/// itself propagates.
fn surface<T>(res: Result<T, ApiError>, out: &mut dyn Write) -> Result<T> {
    match res {
        Ok(value) => Ok(value),
        Err(err) => {
            if let Some(body) = err.response_body() {
                writeln!(out, "got this response body:\n{body}")?;
            }
            Err(err.into())
        }
    }
}

/// Parse durations such as `300ms`, `90s`, `10m`, `1.5h` or `1h30m`.
/// Components are summed as integer nanoseconds; totals past `i64::MAX`
/// nanoseconds are rejected.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err("empty duration".to_string());
    }

    let invalid = || format!("invalid duration {input:?}");
    let overflow = || format!("duration {input:?} out of range");
    let leading_digits = |t: &str| t.find(|c: char| !c.is_ascii_digit()).unwrap_or(t.len());

    let mut total: u64 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let (whole, after) = rest.split_at(leading_digits(rest));
        let (frac, after) = match after.strip_prefix('.') {
            Some(tail) => tail.split_at(leading_digits(tail)),
            None => ("", after),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }

        let unit_end = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let scale: u64 = match &after[..unit_end] {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3_600 * 1_000_000_000,
            "" => return Err(format!("missing unit in duration {input:?}")),
            unit => return Err(format!("unknown unit {unit:?} in duration {input:?}")),
        };

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(overflow)?;
        if !frac.is_empty() {
            // 18 digits is already below nanosecond resolution for every unit.
            let digits = &frac[..frac.len().min(18)];
            let numer: u128 = digits.parse().map_err(|_| invalid())?;
            let part = numer * u128::from(scale) / 10u128.pow(digits.len() as u32);
            let part = u64::try_from(part).map_err(|_| overflow())?;
            nanos = nanos.checked_add(part).ok_or_else(overflow)?;
        }
        total = total.checked_add(nanos).ok_or_else(overflow)?;
        rest = &after[unit_end..];
    }

    if total > i64::MAX as u64 {
        return Err(overflow());
    }
    Ok(Duration::from_nanos(total))
}
