//! Prompt templates steering the assistant towards the Linear tools.

use crate::registry::{
    prompt_fn, CapabilityRegistry, HandlerError, PromptArgument, PromptArguments,
    PromptDescriptor, PromptMessage, RegistrationError,
};

pub(super) fn register(registry: &CapabilityRegistry) -> Result<(), RegistrationError> {
    registry.register_prompt(
        PromptDescriptor::new("create-issue", "Draft and file a well-formed Linear issue")
            .argument(PromptArgument::required("title", "Short summary of the issue"))
            .argument(PromptArgument::optional(
                "description",
                "What happened, what was expected, steps to reproduce",
            ))
            .argument(PromptArgument::optional("team", "Team key, e.g. ENG")),
        prompt_fn(create_issue),
    )?;

    registry.register_prompt(
        PromptDescriptor::new(
            "triage-issue",
            "Review an issue and propose priority, state, labels and assignee",
        )
        .argument(PromptArgument::required("issueId", "Issue ID or identifier")),
        prompt_fn(triage_issue),
    )?;

    registry.register_prompt(
        PromptDescriptor::new(
            "summarize-project",
            "Summarize a project's progress, milestones and risks",
        )
        .argument(PromptArgument::required("projectId", "Project ID")),
        prompt_fn(summarize_project),
    )?;

    registry.register_prompt(
        PromptDescriptor::new(
            "standup-report",
            "Write a standup report from recently updated issues",
        )
        .argument(PromptArgument::optional(
            "team",
            "Team key; defaults to issues assigned to me",
        )),
        prompt_fn(standup_report),
    )?;

    Ok(())
}

/// A required argument, trimmed and non-empty
fn required<'a>(args: &'a PromptArguments, name: &str) -> Result<&'a str, HandlerError> {
    args.get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HandlerError::MissingArgument(name.to_string()))
}

fn optional<'a>(args: &'a PromptArguments, name: &str) -> Option<&'a str> {
    args.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn create_issue(args: &PromptArguments) -> Result<Vec<PromptMessage>, HandlerError> {
    let title = required(args, "title")?;

    let mut request = format!("Create a Linear issue titled \"{}\".", title);
    match optional(args, "team") {
        Some(team) => request.push_str(&format!(" File it in team {}.", team)),
        None => request.push_str(
            " If the team is unclear, call linear_list_teams and ask me which one to use.",
        ),
    }
    if let Some(description) = optional(args, "description") {
        request.push_str(&format!("\n\nDetails:\n{}", description));
    }
    request.push_str(
        "\n\nBefore calling linear_create_issue, rewrite the description as Markdown with \
         Context, Expected behaviour and Steps to reproduce sections where they apply, and \
         pick a priority (1 urgent to 4 low). Check linear_list_labels for matching labels.",
    );

    Ok(vec![PromptMessage::user(request)])
}

fn triage_issue(args: &PromptArguments) -> Result<Vec<PromptMessage>, HandlerError> {
    let issue_id = required(args, "issueId")?;

    Ok(vec![
        PromptMessage::user(format!(
            "Triage Linear issue {id}. Read it with linear_get_issue and its discussion with \
             linear_list_comments. Then propose:\n\
             1. A priority (1 urgent to 4 low) with a one-line reason\n\
             2. The workflow state it belongs in (see linear_list_workflow_states)\n\
             3. Labels to add (see linear_list_labels)\n\
             4. Who should own it, if the history makes that clear\n\n\
             Ask before applying anything with linear_update_issue.",
            id = issue_id
        )),
        PromptMessage::assistant(format!(
            "I'll start by fetching {} and its comments.",
            issue_id
        )),
    ])
}

fn summarize_project(args: &PromptArguments) -> Result<Vec<PromptMessage>, HandlerError> {
    let project_id = required(args, "projectId")?;

    Ok(vec![PromptMessage::user(format!(
        "Summarize Linear project {id} for a status update. Use linear_get_project, \
         linear_list_project_milestones and linear_list_issues with projectId {id}. \
         Cover overall progress, each milestone and whether it is on track for its target \
         date, open urgent or high priority issues, and risks. Keep it under 200 words.",
        id = project_id
    ))])
}

fn standup_report(args: &PromptArguments) -> Result<Vec<PromptMessage>, HandlerError> {
    let scope = match optional(args, "team") {
        Some(team) => format!("linear_list_issues with teamId {}", team),
        None => "linear_list_issues with assigneeId \"me\"".to_string(),
    };

    Ok(vec![PromptMessage::user(format!(
        "Write my standup report. Fetch recently updated issues using {}. Group them into \
         Done (completed since yesterday), In progress, and Blocked or at risk. One bullet per \
         issue with its identifier and title.",
        scope
    ))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Role;

    fn args(pairs: &[(&str, &str)]) -> PromptArguments {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn text(message: &PromptMessage) -> &str {
        message.content.as_text().unwrap()
    }

    #[test]
    fn test_registered_with_arguments() {
        let registry = CapabilityRegistry::new();
        register(&registry).unwrap();

        let names: Vec<String> = registry
            .get_all_prompts()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(
            names,
            ["create-issue", "standup-report", "summarize-project", "triage-issue"]
        );

        let create = registry.get_prompt_by_name("create-issue").unwrap();
        assert!(create.arguments[0].required);
        assert!(!create.arguments[2].required);
    }

    #[test]
    fn test_create_issue_with_team() {
        let messages =
            create_issue(&args(&[("title", "Crash on save"), ("team", "ENG")])).unwrap();
        assert_eq!(messages.len(), 1);
        assert!(text(&messages[0]).contains("\"Crash on save\""));
        assert!(text(&messages[0]).contains("team ENG"));
    }

    #[test]
    fn test_create_issue_blank_title() {
        let err = create_issue(&args(&[("title", "  ")])).unwrap_err();
        assert_eq!(err.to_string(), "Missing required argument: title");
    }

    #[test]
    fn test_triage_has_assistant_turn() {
        let messages = triage_issue(&args(&[("issueId", "ENG-7")])).unwrap();
        assert_eq!(messages[1].role, Role::Assistant);
        assert!(text(&messages[0]).contains("ENG-7"));
    }

    #[test]
    fn test_standup_defaults_to_me() {
        let messages = standup_report(&PromptArguments::new()).unwrap();
        assert!(text(&messages[0]).contains("assigneeId \"me\""));
    }
}
