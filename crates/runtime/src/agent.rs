//! The agent loop: user input, model replies, and one round of tool dispatch.

use std::io::{BufRead, Write};

use crate::model::{Message, ToolCall, ToolResult};
use crate::session::{Gateway, Turn};
use crate::tools::ToolRegistry;
use crate::{Error, Result};

const BLUE: &str = "\u{1b}[94m";
const YELLOW: &str = "\u{1b}[93m";
const GREEN: &str = "\u{1b}[92m";
const RESET: &str = "\u{1b}[0m";

/// Where the agent loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    AwaitingUserInput,
    AwaitingModelResponse,
    DispatchingTools,
    AwaitingFollowupResponse,
    Closed,
}

/// What happened during one user turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnSummary {
    /// Model text, including the follow-up reply, in display order.
    pub texts: Vec<String>,
    /// Results sent back to the model, one per dispatched call.
    pub results: Vec<ToolResult>,
    /// Calls in the follow-up reply that were not dispatched.
    pub skipped_calls: Vec<ToolCall>,
}

/// Drives a conversation between a user and a model with tool access.
pub struct Agent<G> {
    gateway: G,
    tools: ToolRegistry,
    state: AgentState,
    color: bool,
}

impl<G: Gateway> Agent<G> {
    pub fn new(gateway: G, tools: ToolRegistry) -> Self {
        Self {
            gateway,
            tools,
            state: AgentState::AwaitingUserInput,
            color: false,
        }
    }

    /// Decorate labels with ANSI colours.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Run until the input ends or the user quits.
    ///
    /// A gateway failure ends the loop and is returned; tool failures never do.
    pub async fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> Result<()> {
        while self.state == AgentState::AwaitingUserInput {
            let line = self.read_line(&mut input, &mut output).inspect_err(|e| {
                tracing::error!(error = %e, "reading user input failed");
                self.state = AgentState::Closed;
            })?;
            let Some(line) = line else {
                self.state = AgentState::Closed;
                break;
            };
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            if text == "quit" || text == "exit" {
                self.state = AgentState::Closed;
                break;
            }
            if let Err(e) = self.turn(text, &mut output).await {
                self.state = AgentState::Closed;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Send one line of user text and handle the reply.
    pub async fn turn<W: Write>(&mut self, text: &str, output: &mut W) -> Result<TurnSummary> {
        let mut summary = TurnSummary::default();

        self.state = AgentState::AwaitingModelResponse;
        let reply = self.send(Turn::Text(text.to_string())).await?;
        let (texts, calls) = reply.split();
        self.show_texts(&texts, output)?;
        summary.texts.extend(texts);

        if calls.is_empty() {
            self.state = AgentState::AwaitingUserInput;
            return Ok(summary);
        }

        self.state = AgentState::DispatchingTools;
        let results = self.dispatch(&calls, output)?;
        summary.results = results.clone();

        self.state = AgentState::AwaitingFollowupResponse;
        let followup = self.send(Turn::ToolResults(results)).await?;
        let (texts, skipped) = followup.split();
        self.show_texts(&texts, output)?;
        summary.texts.extend(texts);

        if !skipped.is_empty() {
            tracing::warn!(
                count = skipped.len(),
                "follow-up reply requested more tool calls; not dispatching"
            );
        }
        summary.skipped_calls = skipped;

        self.state = AgentState::AwaitingUserInput;
        Ok(summary)
    }

    /// Run each call in order, tracing it first. Always one result per call.
    fn dispatch<W: Write>(&self, calls: &[ToolCall], output: &mut W) -> Result<Vec<ToolResult>> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            let label = self.label("tool", GREEN);
            writeln!(output, "{label}: {}({})", call.name, call.input)?;
            tracing::info!(tool = %call.name, id = %call.id, "dispatching tool call");
            results.push(self.tools.dispatch(call));
        }
        Ok(results)
    }

    async fn send(&mut self, turn: Turn) -> Result<Message> {
        match self.gateway.send_turn(turn).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                tracing::error!(error = %e, "model gateway failed");
                self.state = AgentState::Closed;
                Err(Error::Gateway(e))
            }
        }
    }

    fn read_line<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> Result<Option<String>> {
        write!(output, "{}: ", self.label("You", BLUE))?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn show_texts<W: Write>(&self, texts: &[String], output: &mut W) -> Result<()> {
        let label = self.label("Assistant", YELLOW);
        for text in texts {
            writeln!(output, "{label}: {text}")?;
        }
        Ok(())
    }

    fn label(&self, name: &str, color: &str) -> String {
        if self.color {
            format!("{color}{name}{RESET}")
        } else {
            name.to_string()
        }
    }
}
