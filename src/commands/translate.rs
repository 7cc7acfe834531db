use anyhow::{Result, bail};
use std::io::{BufRead, Write};
use tracing::info;

use crate::commands::write_chat_choices;
use crate::console::Console;
use crate::gateway::{LocalGateway, RemoteGateway};
use crate::model::{ChatRequest, Message};

const TRANSLATOR_ROLE: &str = "You are a professional translator and multi-linguist. \
You are to strictly only answer language translation questions from the user.";
const MAX_TOKENS: u32 = 400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub from: String,
    pub to: String,
    pub sentence: String,
}

impl Translation {
    pub fn instruction(&self) -> String {
        format!(
            "You must now translate the following sentence from {} to {}: {}",
            self.from, self.to, self.sentence
        )
    }
}

fn read_translation<R: BufRead, W: Write>(console: &mut Console<R, W>) -> Result<Translation> {
    let from = console.ask("Please enter the language you want to translate from: ")?;
    let to = console.ask("Please enter the language you want to translate to: ")?;
    let sentence = console.ask("Please enter the sentence or word you want to translate: ")?;

    if sentence.trim().is_empty() {
        bail!("Nothing to translate");
    }
    Ok(Translation { from, to, sentence })
}

pub async fn translate_remote<R, W, G>(console: &mut Console<R, W>, gateway: &G) -> Result<()>
where
    R: BufRead,
    W: Write,
    G: RemoteGateway,
{
    let translation = read_translation(console)?;
    let mut request = ChatRequest::new(
        gateway.deployment(),
        vec![
            Message::system(TRANSLATOR_ROLE),
            Message::user(translation.instruction()),
        ],
    );
    request.max_tokens = Some(MAX_TOKENS);

    let response = gateway.chat_completions(request).await?;
    write_chat_choices(console.out(), &response)
}

pub async fn translate_local<R, W, G>(console: &mut Console<R, W>, gateway: &G) -> Result<()>
where
    R: BufRead,
    W: Write,
    G: LocalGateway,
{
    info!(model = gateway.model_name(), "using local model");
    let translation = read_translation(console)?;
    let prompt = format!("{} {}", TRANSLATOR_ROLE, translation.instruction());

    let completion = gateway.generate(prompt).await?;
    writeln!(console.out(), "Response:\n{}", completion.trim())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{TRANSLATOR_ROLE, Translation, translate_local, translate_remote};
    use crate::console::Console;
    use crate::gateway::stub::{StubLocal, StubRemote};
    use crate::model::{ChatChoice, ChatResponse, MessageRole, ResponseMessage};
    use std::io::Cursor;

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn reply(content: &str) -> ChatResponse {
        ChatResponse {
            choices: vec![ChatChoice {
                index: 0,
                message: Some(ResponseMessage {
                    content: Some(content.to_string()),
                    tool_calls: Vec::new(),
                }),
                finish_reason: Some("stop".to_string()),
                content_filter_results: None,
            }],
        }
    }

    fn assert_in_order(haystack: &str, needles: &[&str]) {
        let mut from = 0;
        for needle in needles {
            let found = haystack[from..]
                .find(needle)
                .unwrap_or_else(|| panic!("'{needle}' not found in order in '{haystack}'"));
            from += found + needle.len();
        }
    }

    #[test]
    fn instruction_names_both_languages_and_sentence() {
        let translation = Translation {
            from: "English".to_string(),
            to: "French".to_string(),
            sentence: "hello".to_string(),
        };
        assert_eq!(
            translation.instruction(),
            "You must now translate the following sentence from English to French: hello"
        );
    }

    #[tokio::test]
    async fn remote_sends_exactly_one_request_with_inputs_in_order() {
        let gateway = StubRemote {
            chat_response: Some(reply("bonjour")),
            ..StubRemote::default()
        };
        let mut console = console("English\nFrench\nhello\n");

        translate_remote(&mut console, &gateway)
            .await
            .expect("translation should succeed");

        assert_eq!(gateway.call_count(), 1);
        let chats = gateway.chats.borrow();
        let request = &chats[0];
        assert_eq!(request.max_tokens, Some(400));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert_eq!(request.messages[0].content, TRANSLATOR_ROLE);
        assert_eq!(request.messages[1].role, MessageRole::User);
        assert_in_order(&request.messages[1].content, &["English", "French", "hello"]);

        let output = String::from_utf8(console.into_output()).expect("utf8");
        assert!(output.contains("Content[0]: bonjour"), "{output}");
        assert!(output.contains("Received chat completions reply"), "{output}");
    }

    #[tokio::test]
    async fn missing_sentence_makes_no_call() {
        let gateway = StubRemote::default();
        let mut console = console("English\nFrench\n");

        assert!(translate_remote(&mut console, &gateway).await.is_err());
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn local_prefixes_translator_role() {
        let gateway = StubLocal::replying("hola\n");
        let mut console = console("English\nSpanish\nhello\n");

        translate_local(&mut console, &gateway)
            .await
            .expect("translation should succeed");

        let prompts = gateway.prompts.borrow();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with(TRANSLATOR_ROLE));
        assert_in_order(&prompts[0], &["English", "Spanish", "hello"]);

        let output = String::from_utf8(console.into_output()).expect("utf8");
        assert!(output.ends_with("Response:\nhola\n"), "{output}");
    }
}
