/// Parser for the `trace` console command, which configures SWO trace
/// capture (`trace start [freq]`, `trace stop`, `trace channel N[..M][,...]`,
/// `trace status`).
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "grammar/trace.pest"]
struct TraceParser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceCommand {
    Start { freq_hz: Option<u32> },
    Stop,
    Status,
    Channel { ranges: Vec<(u8, u8)> },
}

#[derive(Error, Debug)]
pub enum TraceParseError {
    #[error("invalid trace command: {0}")]
    Syntax(String),
    #[error("channel number out of range: {0}")]
    ChannelRange(u32),
}

pub fn parse_trace_command(input: &str) -> Result<TraceCommand, TraceParseError> {
    let mut pairs = TraceParser::parse(Rule::trace_command, input.trim()).map_err(|e| TraceParseError::Syntax(e.to_string()))?;
    let trace_command = pairs.next().ok_or_else(|| TraceParseError::Syntax("empty input".into()))?;
    let inner = trace_command.into_inner().next().ok_or_else(|| TraceParseError::Syntax("missing subcommand".into()))?;

    match inner.as_rule() {
        Rule::start => {
            let freq_hz = inner
                .into_inner()
                .next()
                .map(parse_integer_pair)
                .transpose()?;
            Ok(TraceCommand::Start { freq_hz })
        }
        Rule::stop => Ok(TraceCommand::Stop),
        Rule::status => Ok(TraceCommand::Status),
        Rule::channel_filter => {
            let list = inner.into_inner().next().ok_or_else(|| TraceParseError::Syntax("missing channel list".into()))?;
            let mut ranges = Vec::new();
            for range_pair in list.into_inner() {
                let mut numbers = range_pair.into_inner();
                let start = parse_channel_number(numbers.next().unwrap())?;
                let end = match numbers.next() {
                    Some(p) => parse_channel_number(p)?,
                    None => start,
                };
                ranges.push((start, end));
            }
            Ok(TraceCommand::Channel { ranges })
        }
        _ => Err(TraceParseError::Syntax("unrecognized subcommand".into())),
    }
}

fn parse_integer_pair(pair: Pair<Rule>) -> Result<u32, TraceParseError> {
    pair.as_str().parse().map_err(|_| TraceParseError::Syntax(pair.as_str().to_string()))
}

fn parse_channel_number(pair: Pair<Rule>) -> Result<u8, TraceParseError> {
    let n: u32 = parse_integer_pair(pair)?;
    u8::try_from(n).map_err(|_| TraceParseError::ChannelRange(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_without_frequency() {
        assert_eq!(parse_trace_command("trace start").unwrap(), TraceCommand::Start { freq_hz: None });
    }

    #[test]
    fn start_with_frequency() {
        assert_eq!(
            parse_trace_command("trace start 168000000").unwrap(),
            TraceCommand::Start { freq_hz: Some(168_000_000) }
        );
    }

    #[test]
    fn stop_and_status() {
        assert_eq!(parse_trace_command("trace stop").unwrap(), TraceCommand::Stop);
        assert_eq!(parse_trace_command("trace status").unwrap(), TraceCommand::Status);
    }

    #[test]
    fn channel_single_and_range_list() {
        let cmd = parse_trace_command("trace channel 0,2..4").unwrap();
        assert_eq!(cmd, TraceCommand::Channel { ranges: vec![(0, 0), (2, 4)] });
    }

    #[test]
    fn invalid_subcommand_is_rejected() {
        assert!(parse_trace_command("trace frobnicate").is_err());
    }
}
