//! /agent and /info commands

use super::CommandResult;
use chatdesk_core::{AgentId, AgentProfile};

pub struct AgentCommand;

impl AgentCommand {
    /// `/agent` opens the selector, `/agent <id>` switches directly
    pub fn execute(args: &str) -> CommandResult {
        if args.is_empty() {
            return CommandResult::OpenAgentSelector;
        }
        match AgentProfile::lookup(args) {
            Some(profile) => CommandResult::SelectAgent(profile),
            None => CommandResult::Message(format!(
                "Unknown agent: {}\n\n{}",
                args,
                Self::list_agents_text(None)
            )),
        }
    }

    /// Agent list with the current one marked
    pub fn list_agents_text(current: Option<&AgentId>) -> String {
        let mut out = String::from("Agents:\n");
        for profile in AgentProfile::all() {
            let marker = if current.map(|a| a.as_str()) == Some(profile.id) {
                "*"
            } else {
                " "
            };
            out.push_str(&format!(
                "{} {} {:<16} /agent {}\n",
                marker, profile.icon, profile.name, profile.aliases[0]
            ));
        }
        out.trim_end().to_string()
    }
}

pub struct InfoCommand;

impl InfoCommand {
    pub fn execute(current: Option<&AgentId>) -> CommandResult {
        let text = match current {
            Some(agent) => match agent.profile() {
                Some(profile) => crate::utils::agent_info(profile),
                None => format!("{}\nNo further details for this agent.", agent.display_name()),
            },
            None => match AgentProfile::lookup("general") {
                Some(profile) => format!(
                    "No agent has answered yet; conversations start with:\n\n{}",
                    crate::utils::agent_info(profile)
                ),
                None => "No agent has answered yet.".to_string(),
            },
        };
        CommandResult::Message(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_by_alias() {
        match AgentCommand::execute("technical") {
            CommandResult::SelectAgent(profile) => assert_eq!(profile.id, "EngineerAgent"),
            _ => panic!("expected agent selection"),
        }
    }

    #[test]
    fn test_agent_without_args_opens_selector() {
        assert!(matches!(
            AgentCommand::execute(""),
            CommandResult::OpenAgentSelector
        ));
    }

    #[test]
    fn test_unknown_agent_lists_choices() {
        match AgentCommand::execute("billing") {
            CommandResult::Message(msg) => {
                assert!(msg.contains("Unknown agent: billing"));
                assert!(msg.contains("/agent sales"));
            }
            _ => panic!("expected message"),
        }
    }

    #[test]
    fn test_list_marks_current() {
        let current = AgentId::new("SalesAgent");
        let text = AgentCommand::list_agents_text(Some(&current));
        let sales_line = text.lines().find(|l| l.contains("Sales Agent")).unwrap();
        assert!(sales_line.starts_with('*'));
    }

    #[test]
    fn test_info_for_unknown_agent() {
        let agent = AgentId::new("WelcomeAgent");
        match InfoCommand::execute(Some(&agent)) {
            CommandResult::Message(msg) => assert!(msg.contains("No further details")),
            _ => panic!("expected message"),
        }
    }
}
