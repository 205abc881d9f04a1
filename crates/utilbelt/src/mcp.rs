use crate::prelude::{eprintln, println, *};
use axum::{
    extract::State,
    response::sse::{Event, Sse},
    Json,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use utilbelt_core::{cron, encoding, guid, hash, jwt, mht, serialize, time};

#[derive(Debug, clap::Parser)]
#[command(name = "mcp")]
#[command(about = "Model Context Protocol server")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Start MCP server with stdio transport
    #[clap(name = "stdio")]
    Stdio,

    /// Start MCP server with SSE transport (HTTP)
    #[clap(name = "sse")]
    Sse(SseOptions),
}

#[derive(Debug, clap::Args)]
pub struct SseOptions {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
}

// JSON-RPC 2.0 types
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<serde_json::Value>,
    method: String,
    params: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

// MCP Protocol types
#[derive(Debug, Serialize)]
struct ServerInfo {
    name: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct ServerCapabilities {
    tools: Option<ToolsCapability>,
}

#[derive(Debug, Serialize)]
struct ToolsCapability {}

#[derive(Debug, Serialize)]
struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    protocol_version: String,
    capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    server_info: ServerInfo,
}

#[derive(Debug, Serialize)]
struct Tool {
    name: String,
    description: String,
    #[serde(rename = "inputSchema")]
    input_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ToolsList {
    tools: Vec<Tool>,
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    arguments: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct CallToolResult {
    content: Vec<Content>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    is_error: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum Content {
    #[serde(rename = "text")]
    Text { text: String },
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    match app.command {
        Commands::Stdio => run_stdio(global).await,
        Commands::Sse(options) => run_sse(options, global).await,
    }
}

async fn run_stdio(global: crate::Global) -> Result<()> {
    if global.verbose {
        eprintln!("Starting MCP server with stdio transport...");
        eprintln!();
    }

    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut reader = BufReader::new(stdin);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            break; // EOF
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if global.verbose {
            eprintln!("Received: {trimmed}");
        }

        let response = handle_request(trimmed, &global).await;
        let response_json = serde_json::to_string(&response)?;

        if global.verbose {
            eprintln!("Sending: {response_json}");
        }

        stdout.write_all(response_json.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    Ok(())
}

async fn handle_request(request_str: &str, global: &crate::Global) -> JsonRpcResponse {
    let request: JsonRpcRequest = match serde_json::from_str(request_str) {
        Ok(req) => req,
        Err(e) => {
            return JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id: None,
                result: None,
                error: Some(JsonRpcError {
                    code: -32700,
                    message: format!("Parse error: {e}"),
                    data: None,
                }),
            };
        }
    };

    let result = match request.method.as_str() {
        "initialize" => handle_initialize(),
        "tools/list" => handle_tools_list(),
        "tools/call" => handle_tools_call(request.params, global).await,
        method => Err(JsonRpcError {
            code: -32601,
            message: format!("Method not found: {method}"),
            data: None,
        }),
    };

    match result {
        Ok(value) => JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id: request.id,
            result: Some(value),
            error: None,
        },
        Err(error) => JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id: request.id,
            result: None,
            error: Some(error),
        },
    }
}

fn invalid_params(message: String) -> JsonRpcError {
    JsonRpcError {
        code: -32602,
        message,
        data: None,
    }
}

fn internal_error(message: String) -> JsonRpcError {
    JsonRpcError {
        code: -32603,
        message,
        data: None,
    }
}

fn handle_initialize() -> Result<serde_json::Value, JsonRpcError> {
    let result = InitializeResult {
        protocol_version: "2024-11-05".to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability {}),
        },
        server_info: ServerInfo {
            name: "utilbelt".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    };

    serde_json::to_value(result).map_err(|e| internal_error(format!("Internal error: {e}")))
}

fn handle_tools_list() -> Result<serde_json::Value, JsonRpcError> {
    let tools = vec![
        Tool {
            name: "echo".to_string(),
            description: "Echoes back the provided message".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "message": { "type": "string", "description": "Message to echo" }
                },
                "required": ["message"]
            }),
        },
        Tool {
            name: "hash".to_string(),
            description:
                "Generates SHA1, SHA256, SHA512, and MD5 hashes for the provided input string"
                    .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string", "description": "Text to hash" }
                },
                "required": ["text"]
            }),
        },
        Tool {
            name: "guid".to_string(),
            description: "Generates GUID-shaped random identifiers".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "count": { "type": "number", "description": "How many ids to generate (default: 10)" }
                }
            }),
        },
        Tool {
            name: "time_convert".to_string(),
            description: "Converts a unix timestamp or date string to ISO, UTC, and millisecond renderings".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "time": { "type": ["string", "number"], "description": "Unix timestamp (seconds or millis) or date string" }
                },
                "required": ["time"]
            }),
        },
        Tool {
            name: "cron_describe".to_string(),
            description: "Describes a cron expression and lists its next run times".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "expression": { "type": "string", "description": "Cron expression (5, 6, or 7 fields)" }
                },
                "required": ["expression"]
            }),
        },
        Tool {
            name: "jwt_decode".to_string(),
            description: "Decodes a JWT's header and payload without verifying the signature"
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "token": { "type": "string", "description": "The JWT to decode" }
                },
                "required": ["token"]
            }),
        },
        Tool {
            name: "json_to_yaml".to_string(),
            description: "Converts a JSON value to a YAML document".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "json": { "description": "Any JSON value" }
                },
                "required": ["json"]
            }),
        },
        Tool {
            name: "yaml_to_json".to_string(),
            description: "Converts a YAML document to a JSON value".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "yml": { "type": "string", "description": "YAML document text" }
                },
                "required": ["yml"]
            }),
        },
        Tool {
            name: "base64_encode".to_string(),
            description: "Encodes text as base64".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string", "description": "Text to encode" }
                },
                "required": ["text"]
            }),
        },
        Tool {
            name: "base64_decode".to_string(),
            description: "Decodes base64 back into text".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "encoded": { "type": "string", "description": "Base64 to decode" }
                },
                "required": ["encoded"]
            }),
        },
        Tool {
            name: "mht_fix".to_string(),
            description: "Rewrites an MHT recording so every <img> tag embeds its screenshot as a base64 data URL. Returns the fixed document and the extracted images.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "contents": { "type": "string", "description": "Full text of the .mht file" }
                },
                "required": ["contents"]
            }),
        },
    ];

    let result = ToolsList { tools };

    serde_json::to_value(result).map_err(|e| internal_error(format!("Internal error: {e}")))
}

async fn handle_tools_call(
    params: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    let params: CallToolParams = serde_json::from_value(params.unwrap_or(serde_json::Value::Null))
        .map_err(|e| invalid_params(format!("Invalid params: {e}")))?;

    if global.verbose {
        eprintln!("Calling tool: {}", params.name);
    }

    match params.name.as_str() {
        "echo" => handle_echo(params.arguments),
        "hash" => handle_hash(params.arguments),
        "guid" => handle_guid(params.arguments),
        "time_convert" => handle_time_convert(params.arguments),
        "cron_describe" => handle_cron_describe(params.arguments),
        "jwt_decode" => handle_jwt_decode(params.arguments),
        "json_to_yaml" => handle_json_to_yaml(params.arguments),
        "yaml_to_json" => handle_yaml_to_json(params.arguments),
        "base64_encode" => handle_base64_encode(params.arguments),
        "base64_decode" => handle_base64_decode(params.arguments),
        "mht_fix" => handle_mht_fix(params.arguments),
        _ => Err(invalid_params(format!("Unknown tool: {}", params.name))),
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(
    arguments: Option<serde_json::Value>,
) -> Result<T, JsonRpcError> {
    serde_json::from_value(arguments.unwrap_or(serde_json::Value::Null))
        .map_err(|e| invalid_params(format!("Invalid arguments: {e}")))
}

fn text_result(text: String) -> Result<serde_json::Value, JsonRpcError> {
    let result = CallToolResult {
        content: vec![Content::Text { text }],
        is_error: None,
    };

    serde_json::to_value(result).map_err(|e| internal_error(format!("Internal error: {e}")))
}

fn json_result(value: serde_json::Value) -> Result<serde_json::Value, JsonRpcError> {
    let json_string = serde_json::to_string_pretty(&value)
        .map_err(|e| internal_error(format!("Serialization error: {e}")))?;
    text_result(json_string)
}

fn handle_echo(arguments: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct EchoArgs {
        message: String,
    }

    let args: EchoArgs = parse_args(arguments)?;
    text_result(format!("Tool echo: {}", args.message))
}

fn handle_hash(arguments: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct HashArgs {
        text: String,
    }

    let args: HashArgs = parse_args(arguments)?;
    let hashes = hash::generate_hashes(&args.text);
    json_result(serde_json::json!({ "hashes": hashes }))
}

fn handle_guid(arguments: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct GuidArgs {
        count: Option<usize>,
    }

    // Arguments may be omitted entirely for this tool.
    let args: GuidArgs = match arguments {
        Some(value) => parse_args(Some(value))?,
        None => GuidArgs { count: None },
    };
    let guids = guid::generate_guids(args.count.unwrap_or(10));
    json_result(serde_json::json!({ "guids": guids }))
}

fn handle_time_convert(
    arguments: Option<serde_json::Value>,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct TimeArgs {
        #[serde(default)]
        time: serde_json::Value,
    }

    let args: TimeArgs = parse_args(arguments)?;
    let output = time::convert_time(&args.time)
        .map_err(|e| internal_error(format!("Tool execution error: {e}")))?;
    json_result(serde_json::to_value(output).unwrap_or_default())
}

fn handle_cron_describe(
    arguments: Option<serde_json::Value>,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct CronArgs {
        expression: String,
    }

    let args: CronArgs = parse_args(arguments)?;
    let described = cron::describe_cron(&args.expression)
        .map_err(|e| internal_error(format!("Tool execution error: {e}")))?;
    json_result(serde_json::to_value(described).unwrap_or_default())
}

fn handle_jwt_decode(
    arguments: Option<serde_json::Value>,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct JwtArgs {
        token: String,
    }

    let args: JwtArgs = parse_args(arguments)?;
    let decoded = jwt::decode_jwt(&args.token)
        .map_err(|e| internal_error(format!("Tool execution error: {e}")))?;
    json_result(serde_json::json!({ "payload": decoded.payload, "header": decoded.header }))
}

fn handle_json_to_yaml(
    arguments: Option<serde_json::Value>,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct JsonArgs {
        json: serde_json::Value,
    }

    let args: JsonArgs = parse_args(arguments)?;
    let yml = serialize::json_to_yaml(&args.json)
        .map_err(|e| internal_error(format!("Tool execution error: {e}")))?;
    json_result(serde_json::json!({ "ymlString": yml }))
}

fn handle_yaml_to_json(
    arguments: Option<serde_json::Value>,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct YamlArgs {
        yml: String,
    }

    let args: YamlArgs = parse_args(arguments)?;
    let json = serialize::yaml_to_json(&args.yml)
        .map_err(|e| internal_error(format!("Tool execution error: {e}")))?;
    json_result(serde_json::json!({ "json": json }))
}

fn handle_base64_encode(
    arguments: Option<serde_json::Value>,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct EncodeArgs {
        text: String,
    }

    let args: EncodeArgs = parse_args(arguments)?;
    json_result(serde_json::json!({ "encoded": encoding::encode_text(&args.text) }))
}

fn handle_base64_decode(
    arguments: Option<serde_json::Value>,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct DecodeArgs {
        encoded: String,
    }

    let args: DecodeArgs = parse_args(arguments)?;
    let decoded = encoding::decode_text(&args.encoded)
        .map_err(|e| internal_error(format!("Tool execution error: {e}")))?;
    json_result(serde_json::json!({ "decoded": decoded }))
}

fn handle_mht_fix(arguments: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct MhtArgs {
        contents: String,
    }

    let args: MhtArgs = parse_args(arguments)?;
    let output = mht::fix_mht(&args.contents)
        .map_err(|e| internal_error(format!("Tool execution error: {e}")))?;
    json_result(serde_json::to_value(output).unwrap_or_default())
}

async fn run_sse(options: SseOptions, global: crate::Global) -> Result<()> {
    use axum::{
        routing::{get, post},
        Router,
    };
    use tower_http::cors::{Any, CorsLayer};

    if global.verbose {
        eprintln!(
            "Starting MCP server with SSE transport on {}:{}...",
            options.host, options.port
        );
    }

    let addr = format!("{}:{}", options.host, options.port);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let shared_global = Arc::new(global.clone());

    let app_router = Router::new()
        .route("/sse", get(sse_handler))
        .route("/message", post(message_handler))
        .layer(cors)
        .with_state(shared_global);

    if global.verbose {
        eprintln!("MCP server listening on http://{}", addr);
        eprintln!("SSE endpoint: http://{}/sse", addr);
        eprintln!("Message endpoint: http://{}/message", addr);
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    axum::serve(listener, app_router)
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}

async fn sse_handler(
    State(_global): State<Arc<crate::Global>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = stream::once(async { Ok(Event::default().data("MCP SSE endpoint ready")) });
    Sse::new(stream)
}

async fn message_handler(
    State(global): State<Arc<crate::Global>>,
    Json(request): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let request_str = serde_json::to_string(&request).unwrap_or_default();
    let response = handle_request(&request_str, &global).await;
    Json(serde_json::to_value(response).unwrap_or(serde_json::Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global() -> crate::Global {
        crate::Global { verbose: false }
    }

    fn request(method: &str, params: serde_json::Value) -> String {
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        })
        .to_string()
    }

    fn tool_text(response: &JsonRpcResponse) -> String {
        let result = response.result.as_ref().unwrap();
        result["content"][0]["text"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let response = handle_request(&request("initialize", serde_json::json!({})), &global()).await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "utilbelt");
    }

    #[tokio::test]
    async fn tools_list_contains_every_tool() {
        let response = handle_request(&request("tools/list", serde_json::json!({})), &global()).await;
        let result = response.result.unwrap();
        let tools = result["tools"].as_array().unwrap();
        let names: Vec<&str> = tools
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(tools.len(), 11);
        for expected in [
            "echo",
            "hash",
            "guid",
            "time_convert",
            "cron_describe",
            "jwt_decode",
            "json_to_yaml",
            "yaml_to_json",
            "base64_encode",
            "base64_decode",
            "mht_fix",
        ] {
            assert!(names.contains(&expected), "missing tool {expected}");
        }
    }

    #[tokio::test]
    async fn unknown_method_is_rejected() {
        let response = handle_request(&request("resources/list", serde_json::json!({})), &global()).await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected() {
        let params = serde_json::json!({ "name": "frobnicate", "arguments": {} });
        let response = handle_request(&request("tools/call", params), &global()).await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn echo_round_trips() {
        let params = serde_json::json!({ "name": "echo", "arguments": { "message": "hi" } });
        let response = handle_request(&request("tools/call", params), &global()).await;
        assert_eq!(tool_text(&response), "Tool echo: hi");
    }

    #[tokio::test]
    async fn hash_tool_returns_digests() {
        let params = serde_json::json!({ "name": "hash", "arguments": { "text": "abc" } });
        let response = handle_request(&request("tools/call", params), &global()).await;
        let payload: serde_json::Value = serde_json::from_str(&tool_text(&response)).unwrap();
        assert_eq!(payload["hashes"]["MD5"], "900150983cd24fb0d6963f7d28e17f72");
    }

    #[tokio::test]
    async fn mht_fix_tool_surfaces_count_mismatch() {
        let params = serde_json::json!({
            "name": "mht_fix",
            "arguments": { "contents": "<html><img src=\"cid:shot\"></html>" }
        });
        let response = handle_request(&request("tools/call", params), &global()).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, -32603);
        assert!(error.message.contains("does not match"));
    }

    #[tokio::test]
    async fn parse_error_for_invalid_json() {
        let response = handle_request("this is not json", &global()).await;
        assert_eq!(response.error.unwrap().code, -32700);
    }
}
