use std::str::FromStr;

use crate::{rules::Rules, score::SetScore, side::Side};

pub const COMMANDS: [&str; 12] = [
    "cancel",
    "correct",
    "final_status",
    "known_command",
    "list_commands",
    "name",
    "protocol_version",
    "quit",
    "rally",
    "rules",
    "show_match",
    "version",
];

/// One line of the referee protocol, as accepted by
/// [`Match::update`](crate::match_state::Match::update).
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Cancel(String),
    Correct { of: u64, winner: Side },
    Empty,
    FinalStatus,
    KnownCommand(String),
    ListCommands,
    Name,
    ProtocolVersion,
    Quit,
    Rally { winner: Side, claimed: Option<SetScore> },
    Rules(Rules),
    ShowMatch,
    Version,
}

impl FromStr for Message {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> anyhow::Result<Self> {
        let args: Vec<_> = line.split_ascii_whitespace().collect();

        let Some(command) = args.first() else {
            return Ok(Self::Empty);
        };

        match *command {
            "cancel" => Ok(Self::Cancel(args[1..].join(" "))),
            "correct" => {
                let (Some(of), Some(winner)) = (args.get(1), args.get(2)) else {
                    return Err(anyhow::Error::msg("expected: 'correct SEQ SIDE'"));
                };

                Ok(Self::Correct {
                    of: of.parse()?,
                    winner: Side::from_str(winner)?,
                })
            }
            "final_status" => Ok(Self::FinalStatus),
            "known_command" => {
                let Some(command) = args.get(1) else {
                    return Err(anyhow::Error::msg("expected: 'known_command COMMAND'"));
                };

                Ok(Self::KnownCommand((*command).to_string()))
            }
            "list_commands" => Ok(Self::ListCommands),
            "name" => Ok(Self::Name),
            "protocol_version" => Ok(Self::ProtocolVersion),
            "quit" => Ok(Self::Quit),
            "rally" => {
                let Some(winner) = args.get(1) else {
                    return Err(anyhow::Error::msg("expected: 'rally SIDE [POINTS:POINTS]'"));
                };

                let claimed = if let Some(claimed) = args.get(2) {
                    Some(SetScore::from_str(claimed)?)
                } else {
                    None
                };

                Ok(Self::Rally {
                    winner: Side::from_str(winner)?,
                    claimed,
                })
            }
            "rules" => {
                let err_msg =
                    "expected: 'rules POINTS_TO_WIN SETS_TO_WIN CAP|_ side_out|every_rally'";

                let (Some(points), Some(sets), Some(cap), Some(serve)) =
                    (args.get(1), args.get(2), args.get(3), args.get(4))
                else {
                    return Err(anyhow::Error::msg(err_msg));
                };

                let cap = match *cap {
                    "_" => None,
                    cap => Some(cap.parse()?),
                };

                Ok(Self::Rules(Rules {
                    points_to_win: points.parse()?,
                    sets_to_win: sets.parse()?,
                    cap,
                    serve_rule: serve.parse()?,
                    ..Rules::default()
                }))
            }
            "show_match" => Ok(Self::ShowMatch),
            "version" => Ok(Self::Version),
            _ => Err(anyhow::Error::msg(format!("unknown command: {command}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rally_with_and_without_a_claimed_score() {
        assert_eq!(
            Message::from_str("rally one").unwrap(),
            Message::Rally {
                winner: Side::One,
                claimed: None
            }
        );
        assert_eq!(
            Message::from_str("rally 2 3:5").unwrap(),
            Message::Rally {
                winner: Side::Two,
                claimed: Some(SetScore { one: 3, two: 5 })
            }
        );
        assert!(Message::from_str("rally").is_err());
    }

    #[test]
    fn rules_line_round_trips_through_display() {
        let Message::Rules(rules) = Message::from_str("rules 21 2 30 side_out").unwrap() else {
            unreachable!("expected a rules message");
        };

        assert_eq!(rules, Rules::badminton());
        assert_eq!(Message::from_str(&format!("rules {rules}")).unwrap(), Message::Rules(rules));
    }

    #[test]
    fn unknown_commands_are_rejected() {
        assert!(Message::from_str("serve_first one").is_err());
        assert_eq!(Message::from_str("").unwrap(), Message::Empty);
        assert_eq!(Message::from_str("   ").unwrap(), Message::Empty);
    }
}
