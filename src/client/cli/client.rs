use super::io::{InputStream, write_banner, write_prompt, write_reply};

use crate::client::{ChatModel, ChatSession, Reply, Turn, TurnError};
use crate::types::{ToolCallError, ToolSet};

use anyhow::Result;
use futures::stream::StreamExt;
use serde_json::json;
use tokio::io::AsyncWrite;

/// Reads user lines, talks to the model, runs the tools it asks for and
/// prints what it finally says.
pub struct Agent<M, W> {
    model: M,
    toolset: ToolSet,
    input: InputStream,
    output: W,
}

impl<M, W> Agent<M, W>
where
    M: ChatModel,
    W: AsyncWrite + Unpin,
{
    pub fn new(model: M, toolset: ToolSet, input: InputStream, output: W) -> Self {
        Agent {
            model,
            toolset,
            input,
            output,
        }
    }

    /// Chat until the input runs out. The first failing turn ends the run.
    pub async fn run(&mut self) -> Result<()> {
        let mut session = ChatSession::new();
        write_banner(&mut self.output).await?;
        loop {
            write_prompt(&mut self.output).await?;
            let Some(user_input) = self.input.next().await.transpose()? else {
                break;
            };

            let response = self.run_inference(&mut session, user_input).await?;
            write_reply(&mut self.output, &response).await?;
        }
        tracing::debug!("input exhausted, ending chat");
        Ok(())
    }

    async fn run_inference(&self, session: &mut ChatSession, user_input: String) -> Result<String> {
        let reply = session.send(&self.model, vec![Turn::User(user_input)]).await?;
        if reply.is_empty() {
            return Err(TurnError::EmptyResponse.into());
        }

        let results = self.dispatch_function_calls(&reply)?;
        if results.is_empty() {
            let text = reply.text();
            session.record(reply);
            return Ok(text);
        }
        session.record(reply);

        let mut reply = session.send(&self.model, results).await?;
        // calls in here are never answered, so they must not reach the history
        if reply.function_calls().next().is_some() {
            tracing::warn!("ignoring function calls in reply to function results");
            reply = reply.without_function_calls();
        }
        let text = reply.text();
        session.record(reply);
        Ok(text)
    }

    /// Run every function call in `reply`, in order. All results go back to
    /// the model together.
    fn dispatch_function_calls(&self, reply: &Reply) -> Result<Vec<Turn>, TurnError> {
        let mut results = vec![];
        for call in reply.function_calls() {
            let json = serde_json::to_string(&call.args).map_err(TurnError::ArgumentEncoding)?;
            tracing::debug!(function = %call.name, input = %json, "calling function");

            let result = self
                .toolset
                .try_tool_call(&call.name, &json)
                .map_err(|err| match err {
                    ToolCallError::NotFound(name) => TurnError::UnknownFunction(name),
                    source => TurnError::ToolExecution {
                        name: call.name.clone(),
                        source,
                    },
                })?;

            results.push(Turn::FunctionResult {
                call_id: call.id.clone(),
                name: call.name.clone(),
                response: json!({ "result": result }),
            });
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::model::{FunctionCall, Part};
    use crate::offline_tools::offline_toolset;
    use async_trait::async_trait;
    use futures::stream;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays canned replies and records every history it was sent.
    #[derive(Clone)]
    struct ScriptedModel {
        replies: Arc<Mutex<VecDeque<Reply>>>,
        requests: Arc<Mutex<Vec<Vec<Turn>>>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Reply>) -> Self {
            ScriptedModel {
                replies: Arc::new(Mutex::new(replies.into())),
                requests: Arc::default(),
            }
        }

        fn requests(&self) -> Vec<Vec<Turn>> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn generate(&self, turns: &[Turn]) -> Result<Reply> {
            self.requests.lock().unwrap().push(turns.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("no scripted reply left"))
        }
    }

    fn text(text: &str) -> Reply {
        Reply {
            parts: vec![Part::Text(text.to_string())],
        }
    }

    fn function_call(id: &str, name: &str, args: Value) -> Part {
        Part::FunctionCall(FunctionCall {
            id: id.to_string(),
            name: name.to_string(),
            args,
        })
    }

    fn lines(lines: &[&str]) -> InputStream {
        let lines: Vec<Result<String>> = lines.iter().map(|line| Ok(line.to_string())).collect();
        Box::pin(stream::iter(lines))
    }

    async fn run(model: ScriptedModel, input: &[&str]) -> (Result<()>, String) {
        let mut agent = Agent::new(model, offline_toolset().unwrap(), lines(input), Vec::new());
        let result = agent.run().await;
        (result, String::from_utf8(agent.output).unwrap())
    }

    #[tokio::test]
    async fn ends_cleanly_when_input_is_exhausted() {
        let model = ScriptedModel::new(vec![]);
        let (result, output) = run(model.clone(), &[]).await;
        assert!(result.is_ok());
        assert!(model.requests().is_empty());
        assert_eq!(output, "Chat with Gemini (use 'ctrl-c' to quit)\nYou: ");
    }

    #[tokio::test]
    async fn prints_plain_text_reply() {
        let model = ScriptedModel::new(vec![
            Reply {
                parts: vec![
                    Part::Text("Hello".to_string()),
                    Part::Text(", there".to_string()),
                ],
            },
            text("Bye"),
        ]);
        let (result, output) = run(model.clone(), &["hi", "bye"]).await;
        assert!(result.is_ok());
        assert!(output.contains("\u{1b}[93mGemini\u{1b}[0m: Hello, there\n"));
        assert!(output.contains("\u{1b}[93mGemini\u{1b}[0m: Bye\n"));

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[1],
            vec![
                Turn::User("hi".to_string()),
                Turn::Model(Reply {
                    parts: vec![
                        Part::Text("Hello".to_string()),
                        Part::Text(", there".to_string()),
                    ],
                }),
                Turn::User("bye".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn runs_requested_tool_and_resubmits_result() {
        let model = ScriptedModel::new(vec![
            Reply {
                parts: vec![function_call(
                    "call_0",
                    "calculator",
                    serde_json::json!({"operation": "add", "a": 2, "b": 3}),
                )],
            },
            text("2 + 3 is 5"),
        ]);
        let (result, output) = run(model.clone(), &["what is 2 + 3?"]).await;
        assert!(result.is_ok());
        assert!(output.contains("Gemini\u{1b}[0m: 2 + 3 is 5\n"));

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[1].last(),
            Some(&Turn::FunctionResult {
                call_id: "call_0".to_string(),
                name: "calculator".to_string(),
                response: serde_json::json!({"result": "5.00"}),
            })
        );
    }

    #[tokio::test]
    async fn submits_all_calls_of_one_reply_together() {
        let model = ScriptedModel::new(vec![
            Reply {
                parts: vec![
                    Part::Text("Let me work that out.".to_string()),
                    function_call(
                        "call_0",
                        "calculator",
                        serde_json::json!({"operation": "add", "a": 2, "b": 3}),
                    ),
                    function_call(
                        "call_1",
                        "calculator",
                        serde_json::json!({"operation": "multiply", "a": -4, "b": 2.5}),
                    ),
                ],
            },
            text("5 and -10"),
        ]);
        let (result, output) = run(model.clone(), &["two sums"]).await;
        assert!(result.is_ok());
        assert!(output.contains("Gemini\u{1b}[0m: 5 and -10\n"));
        assert!(!output.contains("Let me work that out."));

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        let results: Vec<_> = requests[1]
            .iter()
            .filter_map(|turn| match turn {
                Turn::FunctionResult { response, .. } => Some(response["result"].clone()),
                _ => None,
            })
            .collect();
        assert_eq!(results, vec![serde_json::json!("5.00"), serde_json::json!("-10.00")]);
    }

    #[tokio::test]
    async fn chained_calls_are_dropped_from_history() {
        let model = ScriptedModel::new(vec![
            Reply {
                parts: vec![function_call(
                    "call_0",
                    "calculator",
                    serde_json::json!({"operation": "add", "a": 2, "b": 3}),
                )],
            },
            Reply {
                parts: vec![
                    Part::Text("Now times 4.".to_string()),
                    function_call(
                        "call_1",
                        "calculator",
                        serde_json::json!({"operation": "multiply", "a": 5, "b": 4}),
                    ),
                ],
            },
            text("Anything else?"),
        ]);
        let (result, output) = run(model.clone(), &["(2 + 3) * 4", "thanks"]).await;
        assert!(result.is_ok());
        assert!(output.contains("Gemini\u{1b}[0m: Now times 4.\n"));

        let requests = model.requests();
        assert_eq!(requests.len(), 3);
        let history = &requests[2];
        assert_eq!(
            history[3..],
            [
                Turn::Model(text("Now times 4.")),
                Turn::User("thanks".to_string()),
            ]
        );

        let answered: Vec<_> = history
            .iter()
            .filter_map(|turn| match turn {
                Turn::FunctionResult { call_id, .. } => Some(call_id.as_str()),
                _ => None,
            })
            .collect();
        for turn in history {
            if let Turn::Model(reply) = turn {
                for call in reply.function_calls() {
                    assert!(answered.contains(&call.id.as_str()), "{} unanswered", call.id);
                }
            }
        }
    }

    #[tokio::test]
    async fn chained_call_without_text_leaves_no_model_turn() {
        let model = ScriptedModel::new(vec![
            Reply {
                parts: vec![function_call(
                    "call_0",
                    "calculator",
                    serde_json::json!({"operation": "add", "a": 2, "b": 3}),
                )],
            },
            Reply {
                parts: vec![function_call(
                    "call_1",
                    "calculator",
                    serde_json::json!({"operation": "multiply", "a": 5, "b": 4}),
                )],
            },
            text("20"),
        ]);
        let (result, _) = run(model.clone(), &["(2 + 3) * 4", "and now?"]).await;
        assert!(result.is_ok());

        let requests = model.requests();
        assert!(matches!(
            requests[2][2..],
            [Turn::FunctionResult { .. }, Turn::User(_)]
        ));
    }

    #[tokio::test]
    async fn empty_reply_fails_the_run() {
        let model = ScriptedModel::new(vec![Reply::default(), text("never read")]);
        let (result, _) = run(model.clone(), &["hello", "again"]).await;
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "empty response from model");
        assert!(matches!(
            err.downcast_ref::<TurnError>(),
            Some(TurnError::EmptyResponse)
        ));
        assert_eq!(model.requests().len(), 1);
    }

    #[tokio::test]
    async fn unknown_function_fails_without_resubmitting() {
        let model = ScriptedModel::new(vec![Reply {
            parts: vec![function_call(
                "call_0",
                "weather",
                serde_json::json!({"city": "Oslo"}),
            )],
        }]);
        let (result, _) = run(model.clone(), &["weather in Oslo?"]).await;
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "model called unknown function: weather");
        assert!(matches!(
            err.downcast_ref::<TurnError>(),
            Some(TurnError::UnknownFunction(name)) if name == "weather"
        ));
        assert_eq!(model.requests().len(), 1);
    }

    #[tokio::test]
    async fn tool_failure_carries_the_tool_error() {
        let model = ScriptedModel::new(vec![Reply {
            parts: vec![function_call(
                "call_0",
                "calculator",
                serde_json::json!({"operation": "divide", "a": 10, "b": 0}),
            )],
        }]);
        let (result, _) = run(model.clone(), &["10 / 0"]).await;
        let err = result.unwrap_err();
        assert_eq!(
            err.to_string(),
            "error executing function calculator: division by zero"
        );
        assert_eq!(model.requests().len(), 1);
    }

    #[tokio::test]
    async fn model_failure_ends_the_run() {
        let model = ScriptedModel::new(vec![]);
        let (result, _) = run(model, &["hello"]).await;
        assert_eq!(result.unwrap_err().to_string(), "no scripted reply left");
    }
}
