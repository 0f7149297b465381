//! InsightForge command line: streamed research chat, framework analyses and
//! competitor discovery against an OpenAI-compatible gateway.

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use insightforge::api::GatewayClient;
use insightforge::citation::{
    format_context, parse_sources, select_sources, Source, CONTEXT_THRESHOLD, DEFAULT_TOP_K,
};
use insightforge::config::Config;
use insightforge::discovery;
use insightforge::frameworks::{self, demo_swot, FrameworkKind};
use insightforge::state::{spawn_turn, ChatSession, ModeSwitch, TurnHandle, TurnUpdate};
use insightforge::types::{ChatMode, Role};
use insightforge::ui::{self, LiveRegion, StyledLine, Tone};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(name = "insightforge")]
#[command(author, version, about = "Market research assistant", long_about = None)]
struct Cli {
    /// Override the configured model id.
    #[arg(long, global = true, env = "INSIGHTFORGE_MODEL")]
    model: Option<String>,

    /// Override the chat-completions endpoint.
    #[arg(long, global = true, env = "INSIGHTFORGE_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive streamed research chat.
    Chat {
        /// Research mode to start in.
        #[arg(long, default_value = "general")]
        mode: ChatMode,

        /// JSON array of retrieved sources to cite under each answer.
        #[arg(long)]
        sources: Option<PathBuf>,
    },
    /// Ask one question, print the streamed answer and exit.
    Ask {
        query: String,

        #[arg(long, default_value = "general")]
        mode: ChatMode,

        /// JSON array of retrieved sources to ground and cite the answer.
        #[arg(long)]
        sources: Option<PathBuf>,

        /// Also write the question and answer as JSON.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run a strategy framework analysis.
    Framework {
        kind: FrameworkKind,

        /// Template input as FIELD=VALUE, e.g. "Company/Product=Notion".
        #[arg(long = "input", value_name = "FIELD=VALUE")]
        inputs: Vec<String>,

        /// Also write the result as JSON.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Discover competitors in a market.
    Discover {
        query: String,

        /// Also write the report as JSON.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, PartialEq, Eq)]
enum ChatInput {
    Empty,
    Ask(String),
    Mode(String),
    Confirm,
    Decline,
    Cancel,
    Help,
    Quit,
}

fn parse_chat_input(line: &str) -> ChatInput {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ChatInput::Ask(line.to_string());
    };
    let (name, rest) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
    match name {
        "mode" => ChatInput::Mode(rest.trim().to_string()),
        "yes" | "y" => ChatInput::Confirm,
        "no" | "n" => ChatInput::Decline,
        "cancel" => ChatInput::Cancel,
        "help" | "?" => ChatInput::Help,
        "quit" | "exit" | "q" => ChatInput::Quit,
        _ => ChatInput::Ask(line.to_string()),
    }
}

fn parse_inputs(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut inputs = BTreeMap::new();
    for pair in pairs {
        let (field, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("input '{pair}' must look like FIELD=VALUE"))?;
        let field = field.trim();
        if field.is_empty() {
            bail!("input '{pair}' has an empty field name");
        }
        inputs.insert(field.to_string(), value.trim().to_string());
    }
    Ok(inputs)
}

/// Write `payload` as pretty JSON wrapped with a generation timestamp.
fn write_json_output(path: &Path, kind: &str, payload: &Value) -> Result<()> {
    let document = json!({
        "kind": kind,
        "generated_at": Utc::now().to_rfc3339(),
        "result": payload,
    });
    let body = serde_json::to_string_pretty(&document)?;
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))
}

fn load_sources(path: Option<&Path>) -> Result<Vec<Source>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let body =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_sources(&body).with_context(|| format!("invalid sources file {}", path.display()))
}

fn notice<W: Write>(out: &mut W, text: impl Into<String>, tone: Tone) -> Result<()> {
    ui::write_lines(out, &[StyledLine::styled(text, tone)])?;
    Ok(())
}

const HELP: &str = "Commands: /mode <general|competitive|industry>, /yes, /no, /cancel, /help, /quit";

struct ChatLoop<W: Write> {
    client: Arc<GatewayClient>,
    session: ChatSession,
    sources: Vec<Source>,
    /// Sources selected for the streaming turn, attached when it finishes.
    cited: Vec<Source>,
    tx: mpsc::UnboundedSender<TurnUpdate>,
    live: LiveRegion,
    out: W,
}

impl<W: Write> ChatLoop<W> {
    fn new(
        client: Arc<GatewayClient>,
        mode: ChatMode,
        sources: Vec<Source>,
        tx: mpsc::UnboundedSender<TurnUpdate>,
        out: W,
    ) -> Self {
        Self {
            client,
            session: ChatSession::new(mode),
            sources,
            cited: Vec::new(),
            tx,
            live: LiveRegion::new(),
            out,
        }
    }

    /// Open a turn and pick the sources it may cite. Returns the context
    /// block for the system prompt, if any source qualified.
    fn begin_turn(&mut self, question: &str) -> Result<(TurnHandle, Option<String>)> {
        let handle = self.session.begin_turn(question)?;
        self.cited = select_sources(&self.sources, CONTEXT_THRESHOLD, DEFAULT_TOP_K);
        let context = Some(format_context(&self.cited)).filter(|context| !context.is_empty());
        Ok((handle, context))
    }

    fn ask(&mut self, question: &str) -> Result<()> {
        match self.begin_turn(question) {
            Ok((handle, context)) => {
                spawn_turn(
                    self.client.clone(),
                    self.session.mode(),
                    context,
                    self.session.history_for_api(),
                    handle,
                    self.tx.clone(),
                );
                ui::write_status(&mut self.out, "Analyzing…")?;
            }
            Err(error) => notice(&mut self.out, format!("{error}"), Tone::Caution)?,
        }
        Ok(())
    }

    /// Returns `false` when the user asked to quit.
    fn handle_input(&mut self, input: ChatInput) -> Result<bool> {
        match input {
            ChatInput::Empty => {}
            ChatInput::Quit => return Ok(false),
            ChatInput::Help => {
                notice(&mut self.out, HELP, Tone::Muted)?;
                if let Some(mode) = self.session.pending_mode() {
                    notice(
                        &mut self.out,
                        format!("Switch to {} is waiting for /yes or /no.", mode.label()),
                        Tone::Caution,
                    )?;
                }
            }
            ChatInput::Ask(question) => self.ask(&question)?,
            ChatInput::Mode(name) => match name.parse::<ChatMode>() {
                Ok(mode) => match self.session.request_mode_switch(mode) {
                    ModeSwitch::Unchanged => {
                        notice(&mut self.out, format!("Already in {}", mode.label()), Tone::Muted)?
                    }
                    ModeSwitch::Applied => ui::write_lines(&mut self.out, &[ui::mode_banner(mode)])?,
                    ModeSwitch::NeedsConfirmation => notice(
                        &mut self.out,
                        format!(
                            "Switching to {} clears this conversation. /yes to continue, /no to stay.",
                            mode.label()
                        ),
                        Tone::Caution,
                    )?,
                },
                Err(error) => notice(&mut self.out, format!("{error}"), Tone::Caution)?,
            },
            ChatInput::Confirm => match self.session.confirm_mode_switch() {
                Some(mode) => {
                    self.live.commit();
                    ui::clear_status(&mut self.out)?;
                    ui::write_lines(&mut self.out, &[ui::mode_banner(mode)])?;
                }
                None => notice(&mut self.out, "Nothing to confirm.", Tone::Muted)?,
            },
            ChatInput::Decline => {
                if self.session.cancel_mode_switch().is_some() {
                    notice(&mut self.out, format!("Staying in {}", self.session.mode().label()), Tone::Muted)?;
                }
            }
            ChatInput::Cancel => {
                if self.session.cancel_turn() {
                    self.redraw_answer()?;
                    self.live.commit();
                    notice(&mut self.out, "Answer cancelled.", Tone::Muted)?;
                }
            }
        }
        Ok(true)
    }

    fn handle_update(&mut self, update: TurnUpdate) -> Result<()> {
        let failure = match &update {
            TurnUpdate::Failed { error, .. } => Some(error.clone()),
            _ => None,
        };
        let finished = !matches!(update, TurnUpdate::Delta { .. });
        if !self.session.apply_update(update, self.cited.clone()) {
            return Ok(());
        }

        self.redraw_answer()?;
        if finished {
            self.live.commit();
            if let Some(error) = failure {
                notice(&mut self.out, format!("Error: {error}"), Tone::Negative)?;
            }
        }
        Ok(())
    }

    /// Rewrite the current turn's answer in place, with its citations once
    /// it is no longer streaming.
    fn redraw_answer(&mut self) -> Result<()> {
        let answered = self
            .session
            .messages()
            .last()
            .is_some_and(|message| message.role == Role::Assistant);
        if !answered {
            ui::clear_status(&mut self.out)?;
            return Ok(());
        }
        // One spare column keeps the streaming cursor from wrapping a row.
        let width = ui::terminal_width().saturating_sub(1);
        let mut lines = match self.session.latest_answer_plan() {
            Some(plan) => ui::answer_lines(&plan, width),
            None => Vec::new(),
        };
        lines.extend(ui::citation_lines(&self.session.latest_answer_citations(), width));
        self.live.redraw(&mut self.out, &lines)?;
        Ok(())
    }
}

async fn run_chat(client: GatewayClient, mode: ChatMode, sources: Vec<Source>) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut chat = ChatLoop::new(Arc::new(client), mode, sources, tx, io::stdout());
    ui::write_lines(&mut chat.out, &[ui::mode_banner(mode)])?;
    notice(&mut chat.out, HELP, Tone::Muted)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if !chat.handle_input(parse_chat_input(&line))? {
                    break;
                }
            }
            Some(update) = rx.recv() => chat.handle_update(update)?,
        }
    }
    chat.session.cancel_turn();
    Ok(())
}

async fn run_ask(
    client: GatewayClient,
    mode: ChatMode,
    sources: Vec<Source>,
    query: &str,
    output: Option<&Path>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut chat = ChatLoop::new(Arc::new(client), mode, sources, tx, io::stdout());
    let (handle, context) = chat.begin_turn(query)?;
    spawn_turn(
        chat.client.clone(),
        mode,
        context,
        chat.session.history_for_api(),
        handle,
        chat.tx.clone(),
    );
    ui::write_status(&mut chat.out, "Analyzing…")?;

    let mut failure = None;
    while chat.session.is_streaming() {
        let Some(update) = rx.recv().await else {
            break;
        };
        if let TurnUpdate::Failed { error, .. } = &update {
            failure = Some(error.clone());
        }
        chat.handle_update(update)?;
    }
    if let Some(error) = failure {
        bail!("{error}");
    }

    if let Some(path) = output {
        let response = chat
            .session
            .messages()
            .last()
            .filter(|message| message.role == Role::Assistant)
            .map(|message| message.content.clone())
            .unwrap_or_default();
        let payload = json!({
            "query": query,
            "mode": mode.id(),
            "response": response,
            "sources": chat.cited,
        });
        write_json_output(path, "chat_analysis", &payload)?;
    }
    Ok(())
}

async fn run_framework(
    client: &GatewayClient,
    kind: FrameworkKind,
    inputs: &BTreeMap<String, String>,
    output: Option<&Path>,
) -> Result<()> {
    let mut out = io::stdout();
    ui::write_status(&mut out, &format!("Running {}: {}…", kind.name(), kind.description()))?;
    let result = match frameworks::analyze(client, kind, inputs).await {
        Ok(result) => result,
        Err(error) if kind == FrameworkKind::Swot => {
            ui::clear_status(&mut out)?;
            notice(&mut out, format!("Gateway unavailable ({error:#}); showing demo analysis."), Tone::Caution)?;
            serde_json::to_value(demo_swot())?
        }
        Err(error) => {
            ui::clear_status(&mut out)?;
            return Err(error);
        }
    };
    ui::clear_status(&mut out)?;
    ui::write_lines(&mut out, &ui::framework_lines(kind, &result, ui::terminal_width()))?;
    if let Some(path) = output {
        write_json_output(path, kind.id(), &result)?;
    }
    Ok(())
}

async fn run_discover(client: &GatewayClient, query: &str, output: Option<&Path>) -> Result<()> {
    let mut out = io::stdout();
    ui::write_status(&mut out, "Discovering competitors…")?;
    let report = discovery::discover(client, query).await;
    ui::clear_status(&mut out)?;
    let report = report?;
    ui::write_lines(&mut out, &ui::discovery_lines(&report, ui::terminal_width()))?;
    if let Some(path) = output {
        write_json_output(path, "discovery", &serde_json::to_value(&report)?)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    config.validate()?;
    let client = GatewayClient::new(&config)?;

    match cli.command {
        Command::Chat { mode, sources } => {
            let sources = load_sources(sources.as_deref())?;
            run_chat(client, mode, sources).await
        }
        Command::Ask {
            query,
            mode,
            sources,
            output,
        } => {
            let sources = load_sources(sources.as_deref())?;
            run_ask(client, mode, sources, &query, output.as_deref()).await
        }
        Command::Framework {
            kind,
            inputs,
            output,
        } => {
            let inputs = parse_inputs(&inputs)?;
            run_framework(&client, kind, &inputs, output.as_deref()).await
        }
        Command::Discover { query, output } => run_discover(&client, &query, output.as_deref()).await,
    }
}
