//! Interactive chat command.

use super::{open_session, require};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::session::ConversationSession;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// A line of user input in the chat loop.
#[derive(Debug, PartialEq)]
enum ChatInput<'a> {
    Exit,
    Clear,
    Summary,
    Videos,
    NewVideo(&'a str),
    Question(&'a str),
}

fn parse_input(input: &str) -> Option<ChatInput<'_>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let (command, rest) = match input.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (input, ""),
    };

    Some(match command.to_lowercase().as_str() {
        "exit" | "quit" if rest.is_empty() => ChatInput::Exit,
        "clear" if rest.is_empty() => ChatInput::Clear,
        "summary" if rest.is_empty() => ChatInput::Summary,
        "videos" if rest.is_empty() => ChatInput::Videos,
        "video" if !rest.is_empty() => ChatInput::NewVideo(rest),
        _ => ChatInput::Question(input),
    })
}

/// Run the interactive chat command.
pub async fn run_chat(video_id: &str, settings: Settings) -> Result<()> {
    require(Operation::Ask)?;

    let pipeline = Pipeline::new(settings)?;
    let session = open_session(&pipeline, video_id).await?;

    println!("\n{}", style(format!("Vidra Chat - {}", video_id)).bold().cyan());
    println!(
        "{}\n",
        style("Ask about the video, or 'exit' to quit. Also: 'clear', 'summary', 'videos', 'video <video id>'.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let Some(input) = parse_input(&line) else {
            continue;
        };

        match input {
            ChatInput::Exit => {
                Output::info("Goodbye!");
                break;
            }
            ChatInput::Clear => {
                session.clear_history().await;
                Output::info("Conversation history cleared.");
            }
            ChatInput::Summary => summarize(&session).await,
            ChatInput::Videos => match pipeline.list_transcripts() {
                Ok(videos) if videos.is_empty() => Output::warning("No processed videos yet."),
                Ok(videos) => {
                    for (id, _) in videos {
                        Output::list_item(&id);
                    }
                }
                Err(e) => Output::error(&format!("Error: {}", e)),
            },
            ChatInput::NewVideo(id) => match pipeline.load_transcript(id) {
                Ok(text) => {
                    let spinner = Output::spinner("Indexing transcript...");
                    let result = session.new_video(&text).await;
                    spinner.finish_and_clear();
                    match result {
                        Ok(chunks) => Output::success(&format!(
                            "Switched to '{}' ({} chunks). History cleared.",
                            id, chunks
                        )),
                        Err(e) => Output::error(&format!("Could not index '{}': {}", id, e)),
                    }
                }
                Err(e) => Output::error(&format!("Error: {}", e)),
            },
            ChatInput::Question(question) => {
                let spinner = Output::spinner("Thinking...");
                let outcome = session.ask(question).await;
                spinner.finish_and_clear();

                match outcome {
                    Ok(outcome) => {
                        println!("\n{} {}\n", style("Vidra:").cyan().bold(), outcome.answer);
                        for chunk in &outcome.sources {
                            println!("  {}", style(format!("source {}", chunk.format_span())).dim());
                        }
                    }
                    Err(e) => Output::error(&format!("Error: {}", e)),
                }
            }
        }
    }

    Ok(())
}

async fn summarize(session: &ConversationSession) {
    let spinner = Output::spinner("Summarizing...");
    let summary = session.summarize().await;
    spinner.finish_and_clear();

    match summary {
        Ok(summary) => Output::answer(&summary),
        Err(e) => Output::error(&format!("Summary failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_input("  "), None);
        assert_eq!(parse_input("EXIT"), Some(ChatInput::Exit));
        assert_eq!(parse_input("clear\n"), Some(ChatInput::Clear));
        assert_eq!(parse_input("summary"), Some(ChatInput::Summary));
        assert_eq!(parse_input("videos"), Some(ChatInput::Videos));
        assert_eq!(parse_input("video  lecture-2 "), Some(ChatInput::NewVideo("lecture-2")));
        assert_eq!(parse_input("new lecture-2"), Some(ChatInput::Question("new lecture-2")));
    }

    #[test]
    fn test_commands_with_extra_words_are_questions() {
        assert_eq!(
            parse_input("clear up the confusion about tides"),
            Some(ChatInput::Question("clear up the confusion about tides"))
        );
        assert_eq!(parse_input("video"), Some(ChatInput::Question("video")));
    }
}
