//! End-to-end dispatch scenarios.
//!
//! Each test builds a dispatcher through the public API, feeds it one or more
//! messages and checks the exact reply shape a client would receive.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mcp_dispatch::capability::{
    Arguments, HandlerResult, Prompt, PromptArgument, Resource, Tool, UriParams,
};
use mcp_dispatch::error::MessageError;
use mcp_dispatch::mcp::protocol::{validate, ErrorCode};
use mcp_dispatch::mcp::{Dispatcher, Message, OutgoingMessage, ServerInfo};
use mcp_dispatch::schema::{self, SchemaNode, SchemaType};
use serde_json::{json, Value};

fn dispatcher() -> Dispatcher {
    Dispatcher::new(ServerInfo::default())
}

fn add_tool() -> Tool {
    Tool::new(
        "add",
        "Adds two numbers",
        SchemaNode::from_field_types([("a", SchemaType::Number), ("b", SchemaType::Number)]),
        |args: &Arguments| -> HandlerResult {
            let (a, b) = (&args["a"], &args["b"]);
            match (a.as_i64(), b.as_i64()) {
                (Some(a), Some(b)) => Ok(json!(a + b)),
                _ => Ok(json!(a.as_f64().unwrap_or_default() + b.as_f64().unwrap_or_default())),
            }
        },
    )
    .unwrap()
}

fn reply_json(dispatcher: &Dispatcher, message: Message) -> Value {
    let reply = dispatcher.handle(message).expect("request produces a reply");
    serde_json::to_value(reply).unwrap()
}

// =============================================================================
// Listed Scenarios
// =============================================================================

#[test]
fn test_tools_list_on_empty_registry() {
    let value = reply_json(&dispatcher(), Message::request(1_i64, "tools/list", None));
    assert_eq!(
        value,
        json!({"jsonrpc": "2.0", "id": 1, "result": {"tools": []}})
    );
}

#[test]
fn test_add_tool_call() {
    let mut dispatcher = dispatcher();
    dispatcher.register_tool(add_tool());

    let value = reply_json(
        &dispatcher,
        Message::request(
            2_i64,
            "tools/call",
            Some(json!({"name": "add", "arguments": {"a": 2, "b": 3}})),
        ),
    );
    assert!(value.get("error").is_none());
    assert_eq!(value["result"]["content"][0]["text"], "5");
}

#[test]
fn test_add_tool_missing_argument() {
    let mut dispatcher = dispatcher();
    dispatcher.register_tool(add_tool());

    let value = reply_json(
        &dispatcher,
        Message::request(
            3_i64,
            "tools/call",
            Some(json!({"name": "add", "arguments": {"a": 2}})),
        ),
    );
    assert_eq!(value["id"], 3);
    assert_eq!(value["error"]["code"], ErrorCode::InvalidParams.code());
    assert_eq!(value["error"]["data"]["kind"], "missing_required_fields");
    assert_eq!(value["error"]["data"]["fields"], json!(["b"]));
}

#[test]
fn test_resource_template_extracts_parameters() {
    let seen: Arc<Mutex<Vec<UriParams>>> = Arc::default();
    let recorder = Arc::clone(&seen);

    let mut dispatcher = dispatcher();
    dispatcher.register_resource(
        Resource::new(
            "user://{user_id}/profile",
            "User profile",
            move |params: &UriParams| -> HandlerResult {
                recorder.lock().unwrap().push(params.clone());
                Ok(json!("profile"))
            },
        )
        .unwrap(),
    );

    let value = reply_json(
        &dispatcher,
        Message::request(
            4_i64,
            "resources/read",
            Some(json!({"uri": "user://42/profile"})),
        ),
    );
    assert_eq!(value["result"]["contents"][0]["text"], "profile");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].get("user_id").map(String::as_str), Some("42"));
    assert_eq!(seen[0].len(), 1);
}

#[test]
fn test_unmatched_uri_is_method_not_found() {
    let mut dispatcher = dispatcher();
    dispatcher.register_resource(
        Resource::new("user://{user_id}/profile", "User profile", |_: &UriParams| -> HandlerResult {
            Ok(json!("profile"))
        })
        .unwrap(),
    );

    let value = reply_json(
        &dispatcher,
        Message::request(5_i64, "resources/read", Some(json!({"uri": "order://99"}))),
    );
    assert_eq!(value["id"], 5);
    assert_eq!(value["error"]["code"], ErrorCode::MethodNotFound.code());
    assert_eq!(value["error"]["data"]["kind"], "uri_not_matched");
}

#[test]
fn test_wrong_jsonrpc_version_rejected_before_routing() {
    let raw = json!({"jsonrpc": "1.0", "method": "x"});
    assert_eq!(validate(&raw), Err(MessageError::InvalidJsonrpcVersion));
}

// =============================================================================
// Testable Properties
// =============================================================================

#[test]
fn test_listing_reproduces_registered_metadata() {
    let schema = SchemaNode::object()
        .required_property("query", SchemaNode::string().with_description("Search text"))
        .property("limit", SchemaNode::integer().with_range(Some(1.0), Some(50.0)));

    let mut dispatcher = dispatcher();
    dispatcher.register_tool(
        Tool::new("search", "Searches", schema.clone(), |_: &Arguments| -> HandlerResult {
            Ok(json!([]))
        })
        .unwrap(),
    );
    dispatcher.register_resource(
        Resource::new("config://app", "App config", |_: &UriParams| -> HandlerResult {
            Ok(json!({}))
        })
        .unwrap()
        .with_description("Current configuration")
        .with_mime_type("application/json"),
    );
    dispatcher.register_prompt(
        Prompt::new("review", |_: &Arguments| -> HandlerResult { Ok(json!("")) })
            .with_description("Reviews code")
            .with_argument(PromptArgument::required("code").with_description("Code to review"))
            .with_argument(PromptArgument::optional("focus")),
    );

    let tools = reply_json(&dispatcher, Message::request(1_i64, "tools/list", None));
    assert_eq!(
        tools["result"]["tools"],
        json!([{
            "name": "search",
            "description": "Searches",
            "inputSchema": serde_json::to_value(&schema).unwrap()
        }])
    );

    let resources = reply_json(&dispatcher, Message::request(2_i64, "resources/list", None));
    assert_eq!(
        resources["result"]["resources"],
        json!([{
            "uri": "config://app",
            "name": "App config",
            "description": "Current configuration",
            "mimeType": "application/json"
        }])
    );

    let prompts = reply_json(&dispatcher, Message::request(3_i64, "prompts/list", None));
    assert_eq!(
        prompts["result"]["prompts"],
        json!([{
            "name": "review",
            "description": "Reviews code",
            "arguments": [
                {"name": "code", "description": "Code to review", "required": true},
                {"name": "focus", "required": false}
            ]
        }])
    );
}

#[test]
fn test_handler_never_sees_missing_required_fields() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut dispatcher = dispatcher();
    dispatcher.register_tool(
        Tool::new(
            "needs_both",
            "",
            SchemaNode::object()
                .required_property("x", SchemaNode::string())
                .required_property("y", SchemaNode::string()),
            move |args: &Arguments| -> HandlerResult {
                assert!(args.contains_key("x") && args.contains_key("y"));
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(json!("ok"))
            },
        )
        .unwrap(),
    );

    for arguments in [json!({}), json!({"x": "1"}), json!({"y": "2"})] {
        let value = reply_json(
            &dispatcher,
            Message::request(
                1_i64,
                "tools/call",
                Some(json!({"name": "needs_both", "arguments": arguments})),
            ),
        );
        assert_eq!(value["error"]["data"]["kind"], "missing_required_fields");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    reply_json(
        &dispatcher,
        Message::request(
            1_i64,
            "tools/call",
            Some(json!({"name": "needs_both", "arguments": {"x": "1", "y": "2"}})),
        ),
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_validation_is_idempotent() {
    let schema = SchemaNode::object()
        .required_property("tags", SchemaNode::array(SchemaNode::string()))
        .property("nested", SchemaNode::object().property("n", SchemaNode::integer()));
    let value = json!({"tags": ["a", "b"], "nested": {"n": 1}, "extra": true});
    let before = value.clone();

    let first = schema::validate(&value, &schema).unwrap();
    let second = schema::validate(first, &schema).unwrap();
    assert_eq!(second, &before);
    assert_eq!(value, before);
}

#[test]
fn test_handler_failure_does_not_disturb_registry() {
    let mut dispatcher = dispatcher();
    dispatcher.register_tool(add_tool());
    dispatcher.register_tool(
        Tool::new("crash", "", SchemaNode::object(), |_: &Arguments| -> HandlerResult {
            panic!("handler bug")
        })
        .unwrap(),
    );

    let reply = dispatcher
        .handle(Message::request(
            1_i64,
            "tools/call",
            Some(json!({"name": "crash"})),
        ))
        .unwrap();
    let OutgoingMessage::Error(err) = reply else {
        panic!("Expected error");
    };
    assert_eq!(err.error.code, ErrorCode::InternalError.code());
    assert!(err.error.message.contains("handler bug"));

    let value = reply_json(
        &dispatcher,
        Message::request(
            2_i64,
            "tools/call",
            Some(json!({"name": "add", "arguments": {"a": 1, "b": 1}})),
        ),
    );
    assert_eq!(value["result"]["content"][0]["text"], "2");
    assert_eq!(dispatcher.registry().tool_count(), 2);
}
