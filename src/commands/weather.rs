use anyhow::{Context, Result, bail};
use std::io::Write;
use tracing::debug;

use crate::gateway::RemoteGateway;
use crate::model::{ChatRequest, Message};
use crate::tools::{WEATHER_FUNCTION_NAME, WeatherQuery, parse_arguments, weather_function};

const WEATHER_QUESTION: &str =
    "What's the weather like in London in the UK? Give this to me in celsius";

/// Asks a fixed weather question with `get_current_weather` available and
/// decodes the arguments the model chose for it.
pub async fn run<W: Write, G: RemoteGateway>(out: &mut W, gateway: &G) -> Result<WeatherQuery> {
    let mut request = ChatRequest::new(
        gateway.deployment(),
        vec![Message::user(WEATHER_QUESTION)],
    );
    request.temperature = Some(0.0);
    request.tool = Some(weather_function());

    let response = gateway.chat_completions(request).await?;
    let call = response
        .first_tool_call()
        .context("The model answered without calling a function")?;
    debug!(
        tool_call_id = %call.id,
        function = %call.function.name,
        "received function call"
    );

    writeln!(out, "Function name: {:?}", call.function.name)?;
    if call.function.name != WEATHER_FUNCTION_NAME {
        bail!(
            "The model called unknown function '{}', expected '{}'",
            call.function.name,
            WEATHER_FUNCTION_NAME
        );
    }

    let query: WeatherQuery = parse_arguments(&call.function)?;
    writeln!(
        out,
        "Parameters: location={:?}, unit={}",
        query.location,
        query.unit.map_or("unspecified", |unit| unit.as_str())
    )?;
    Ok(query)
}
