//! In-memory tracker for testing and offline use.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

use super::{IssueTracker, TrackerError};
use crate::models::{
    priority_label, Attachment, Comment, Issue, IssueDraft, IssueFilter, IssueUpdate, Label,
    LabelDraft, Project, ProjectMilestone, Ref, StateRef, Team, User, WorkflowState,
};

/// A tracker that serves and mutates fixtures held in memory.
///
/// Teams can be addressed by ID or key and issues by ID or identifier,
/// matching what the Linear API accepts. [`MockTracker::fail_with`] makes
/// every call fail, for exercising error paths.
#[derive(Debug, Default)]
pub struct MockTracker {
    state: Mutex<MockState>,
    failure: Mutex<Option<TrackerError>>,
}

#[derive(Debug, Default)]
struct MockState {
    viewer: Option<User>,
    users: Vec<User>,
    teams: Vec<Team>,
    issues: Vec<Issue>,
    comments: HashMap<String, Vec<Comment>>,
    attachments: HashMap<String, Vec<Attachment>>,
    projects: Vec<Project>,
    milestones: HashMap<String, Vec<ProjectMilestone>>,
    labels: Vec<Label>,
    next_id: u64,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn team(&self, id_or_key: &str) -> Option<&Team> {
        self.teams
            .iter()
            .find(|t| t.id == id_or_key || t.key.eq_ignore_ascii_case(id_or_key))
    }

    fn issue_index(&self, id: &str) -> Option<usize> {
        self.issues
            .iter()
            .position(|i| i.id == id || i.identifier.eq_ignore_ascii_case(id))
    }

    fn user_ref(&self, id: &str) -> Result<Ref, TrackerError> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(|u| Ref::new(&u.id, &u.name))
            .ok_or_else(|| TrackerError::NotFound(format!("user {}", id)))
    }

    fn project_ref(&self, id: &str) -> Result<Ref, TrackerError> {
        self.projects
            .iter()
            .find(|p| p.id == id)
            .map(|p| Ref::new(&p.id, &p.name))
            .ok_or_else(|| TrackerError::NotFound(format!("project {}", id)))
    }

    fn label_names(&self, ids: &[String]) -> Result<Vec<String>, TrackerError> {
        ids.iter()
            .map(|id| {
                self.labels
                    .iter()
                    .find(|l| &l.id == id)
                    .map(|l| l.name.clone())
                    .ok_or_else(|| TrackerError::NotFound(format!("label {}", id)))
            })
            .collect()
    }
}

fn state_ref(state: &WorkflowState) -> StateRef {
    StateRef {
        id: state.id.clone(),
        name: state.name.clone(),
        state_type: state.state_type.clone(),
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

impl MockTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracker populated with a small workspace
    ///
    /// Team `ENG` with five workflow states, two users, three issues,
    /// one project with two milestones and two labels.
    pub fn with_fixtures() -> Self {
        let tracker = Self::new();
        {
            let mut state = tracker.state.lock();

            let ada = User::new("user-ada", "Ada Lovelace").with_email("ada@example.com");
            let grace = User::new("user-grace", "Grace Hopper").with_email("grace@example.com");
            state.viewer = Some(ada.clone());

            let mut eng = Team::new("team-eng", "ENG", "Engineering");
            eng.description = Some("Product engineering".into());
            eng.created_at = Some(timestamp(1_704_067_200));
            for (position, (id, name, kind)) in [
                ("state-backlog", "Backlog", "backlog"),
                ("state-todo", "Todo", "unstarted"),
                ("state-progress", "In Progress", "started"),
                ("state-done", "Done", "completed"),
                ("state-canceled", "Canceled", "canceled"),
            ]
            .into_iter()
            .enumerate()
            {
                let mut workflow = WorkflowState::new(id, name, kind);
                workflow.position = position as f64;
                eng.states.push(workflow);
            }
            eng.members = vec![Ref::new(&ada.id, &ada.name), Ref::new(&grace.id, &grace.name)];

            state.labels = vec![
                Label {
                    id: "label-bug".into(),
                    name: "bug".into(),
                    color: "#eb5757".into(),
                    description: Some("Something is broken".into()),
                    team: Some(Ref::new(&eng.id, &eng.name)),
                },
                Label {
                    id: "label-feature".into(),
                    name: "feature".into(),
                    color: "#4ea7fc".into(),
                    description: None,
                    team: None,
                },
            ];

            let launch = Project {
                id: "project-launch".into(),
                name: "Public launch".into(),
                description: Some("Everything needed for GA".into()),
                state: "started".into(),
                progress: 0.4,
                url: "https://linear.app/acme/project/public-launch".into(),
                lead: Some(Ref::new(&ada.id, &ada.name)),
                teams: vec![Ref::new(&eng.id, &eng.name)],
                start_date: NaiveDate::from_ymd_opt(2024, 4, 1),
                target_date: NaiveDate::from_ymd_opt(2024, 9, 30),
                created_at: timestamp(1_711_929_600),
            };
            state.milestones.insert(
                launch.id.clone(),
                vec![
                    ProjectMilestone {
                        id: "milestone-beta".into(),
                        name: "Beta".into(),
                        description: None,
                        target_date: NaiveDate::from_ymd_opt(2024, 7, 1),
                        sort_order: 1.0,
                    },
                    ProjectMilestone {
                        id: "milestone-ga".into(),
                        name: "GA".into(),
                        description: Some("General availability".into()),
                        target_date: NaiveDate::from_ymd_opt(2024, 9, 30),
                        sort_order: 2.0,
                    },
                ],
            );

            let issue = |n: u32, title: &str, priority: u8, workflow: &WorkflowState| Issue {
                id: format!("issue-{}", n),
                identifier: format!("ENG-{}", n),
                title: title.to_string(),
                description: None,
                priority,
                priority_label: priority_label(priority).to_string(),
                estimate: None,
                url: format!("https://linear.app/acme/issue/ENG-{}", n),
                state: Some(state_ref(workflow)),
                assignee: None,
                team: Some(Ref::new("team-eng", "Engineering")),
                project: None,
                labels: Vec::new(),
                due_date: None,
                created_at: timestamp(1_714_557_600 + i64::from(n) * 3600),
                updated_at: timestamp(1_714_557_600 + i64::from(n) * 7200),
                completed_at: None,
            };

            let mut login = issue(1, "Login fails with SSO", 1, &eng.states[2]);
            login.description = Some("Users with Okta SSO get a 500 after redirect.".into());
            login.assignee = Some(Ref::new(&ada.id, &ada.name));
            login.labels = vec!["bug".into()];
            login.project = Some(Ref::new(&launch.id, &launch.name));

            let mut export = issue(2, "CSV export for reports", 3, &eng.states[1]);
            export.assignee = Some(Ref::new(&grace.id, &grace.name));
            export.labels = vec!["feature".into()];
            export.project = Some(Ref::new(&launch.id, &launch.name));
            export.estimate = Some(3.0);

            let mut typo = issue(3, "Typo on pricing page", 4, &eng.states[3]);
            typo.completed_at = Some(typo.updated_at);

            state.comments.insert(
                login.id.clone(),
                vec![Comment {
                    id: "comment-1".into(),
                    body: "Reproduced on staging.".into(),
                    user: Some(Ref::new(&grace.id, &grace.name)),
                    created_at: timestamp(1_714_600_000),
                }],
            );
            state.attachments.insert(
                login.id.clone(),
                vec![Attachment {
                    id: "attachment-1".into(),
                    title: "Fix SSO redirect".into(),
                    subtitle: Some("PR #42".into()),
                    url: "https://github.com/acme/app/pull/42".into(),
                    created_at: timestamp(1_714_610_000),
                }],
            );

            state.issues = vec![login, export, typo];
            state.projects = vec![launch];
            state.teams = vec![eng];
            state.users = vec![ada, grace];
        }
        tracker
    }

    /// Make every subsequent call fail with `error`
    pub fn fail_with(&self, error: TrackerError) {
        *self.failure.lock() = Some(error);
    }

    pub fn clear_failure(&self) {
        *self.failure.lock() = None;
    }

    pub fn set_viewer(&self, user: User) {
        let mut state = self.state.lock();
        if !state.users.iter().any(|u| u.id == user.id) {
            state.users.push(user.clone());
        }
        state.viewer = Some(user);
    }

    pub fn add_user(&self, user: User) {
        self.state.lock().users.push(user);
    }

    pub fn add_team(&self, team: Team) {
        self.state.lock().teams.push(team);
    }

    pub fn add_issue(&self, issue: Issue) {
        self.state.lock().issues.push(issue);
    }

    pub fn add_project(&self, project: Project) {
        self.state.lock().projects.push(project);
    }

    pub fn add_label(&self, label: Label) {
        self.state.lock().labels.push(label);
    }

    /// Snapshot of all issues
    pub fn issues(&self) -> Vec<Issue> {
        self.state.lock().issues.clone()
    }

    fn check(&self) -> Result<(), TrackerError> {
        match &*self.failure.lock() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IssueTracker for MockTracker {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn viewer(&self) -> Result<User, TrackerError> {
        self.check()?;
        self.state
            .lock()
            .viewer
            .clone()
            .ok_or_else(|| TrackerError::Unauthorized("no viewer configured".into()))
    }

    async fn list_users(&self, limit: u32) -> Result<Vec<User>, TrackerError> {
        self.check()?;
        let state = self.state.lock();
        Ok(state.users.iter().take(limit as usize).cloned().collect())
    }

    async fn get_user(&self, id: &str) -> Result<User, TrackerError> {
        self.check()?;
        let state = self.state.lock();
        state
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(format!("user {}", id)))
    }

    async fn list_teams(&self, limit: u32) -> Result<Vec<Team>, TrackerError> {
        self.check()?;
        let state = self.state.lock();
        Ok(state
            .teams
            .iter()
            .take(limit as usize)
            .map(Team::summary)
            .collect())
    }

    async fn get_team(&self, id: &str) -> Result<Team, TrackerError> {
        self.check()?;
        let state = self.state.lock();
        state
            .team(id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(format!("team {}", id)))
    }

    async fn list_workflow_states(
        &self,
        team_id: Option<&str>,
    ) -> Result<Vec<WorkflowState>, TrackerError> {
        self.check()?;
        let state = self.state.lock();
        match team_id {
            Some(id) => state
                .team(id)
                .map(|t| t.states.clone())
                .ok_or_else(|| TrackerError::NotFound(format!("team {}", id))),
            None => Ok(state.teams.iter().flat_map(|t| t.states.clone()).collect()),
        }
    }

    async fn list_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>, TrackerError> {
        self.check()?;
        let state = self.state.lock();

        let team_id = match &filter.team_id {
            Some(id) => Some(
                state
                    .team(id)
                    .map(|t| t.id.clone())
                    .ok_or_else(|| TrackerError::NotFound(format!("team {}", id)))?,
            ),
            None => None,
        };

        let matches = |issue: &&Issue| {
            let field_is = |field: Option<&Ref>, want: &Option<String>| match want {
                Some(want) => field.is_some_and(|r| &r.id == want),
                None => true,
            };
            field_is(issue.team.as_ref(), &team_id)
                && field_is(issue.assignee.as_ref(), &filter.assignee_id)
                && field_is(issue.project.as_ref(), &filter.project_id)
                && filter.state.as_ref().map_or(true, |want| {
                    issue
                        .state
                        .as_ref()
                        .is_some_and(|s| s.name.eq_ignore_ascii_case(want))
                })
                && filter.label.as_ref().map_or(true, |want| {
                    issue.labels.iter().any(|l| l.eq_ignore_ascii_case(want))
                })
        };

        Ok(state
            .issues
            .iter()
            .filter(matches)
            .take(filter.limit as usize)
            .cloned()
            .collect())
    }

    async fn get_issue(&self, id: &str) -> Result<Issue, TrackerError> {
        self.check()?;
        let state = self.state.lock();
        state
            .issue_index(id)
            .map(|i| state.issues[i].clone())
            .ok_or_else(|| TrackerError::NotFound(format!("issue {}", id)))
    }

    async fn search_issues(&self, query: &str, limit: u32) -> Result<Vec<Issue>, TrackerError> {
        self.check()?;
        if query.trim().is_empty() {
            return Err(TrackerError::InvalidRequest("search query is empty".into()));
        }
        let needle = query.to_lowercase();
        let state = self.state.lock();
        Ok(state
            .issues
            .iter()
            .filter(|i| {
                i.identifier.to_lowercase() == needle
                    || i.title.to_lowercase().contains(&needle)
                    || i.description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn create_issue(&self, draft: &IssueDraft) -> Result<Issue, TrackerError> {
        self.check()?;
        if draft.title.trim().is_empty() {
            return Err(TrackerError::InvalidRequest("title must not be empty".into()));
        }

        let mut state = self.state.lock();
        let team = state
            .team(&draft.team_id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(format!("team {}", draft.team_id)))?;

        let workflow = match &draft.state_id {
            Some(id) => Some(
                team.states
                    .iter()
                    .find(|s| &s.id == id)
                    .ok_or_else(|| TrackerError::NotFound(format!("workflow state {}", id)))?,
            ),
            None => team
                .states
                .iter()
                .find(|s| s.state_type == "unstarted")
                .or_else(|| team.states.first()),
        };

        let assignee = draft
            .assignee_id
            .as_deref()
            .map(|id| state.user_ref(id))
            .transpose()?;
        let project = draft
            .project_id
            .as_deref()
            .map(|id| state.project_ref(id))
            .transpose()?;
        let labels = state.label_names(&draft.label_ids)?;

        let number = state
            .issues
            .iter()
            .filter(|i| i.team.as_ref().is_some_and(|t| t.id == team.id))
            .count()
            + 1;
        let priority = draft.priority.unwrap_or(0);
        let now = Utc::now();
        let identifier = format!("{}-{}", team.key, number);

        let issue = Issue {
            id: state.next_id("issue"),
            url: format!("https://linear.app/mock/issue/{}", identifier),
            identifier,
            title: draft.title.clone(),
            description: draft.description.clone(),
            priority,
            priority_label: priority_label(priority).to_string(),
            estimate: draft.estimate,
            state: workflow.map(state_ref),
            assignee,
            team: Some(Ref::new(&team.id, &team.name)),
            project,
            labels,
            due_date: draft.due_date,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        state.issues.push(issue.clone());
        Ok(issue)
    }

    async fn update_issue(&self, id: &str, update: &IssueUpdate) -> Result<Issue, TrackerError> {
        self.check()?;
        if update.is_empty() {
            return Err(TrackerError::InvalidRequest("no fields to update".into()));
        }

        let mut state = self.state.lock();
        let index = state
            .issue_index(id)
            .ok_or_else(|| TrackerError::NotFound(format!("issue {}", id)))?;

        let workflow = match &update.state_id {
            Some(state_id) => {
                let team_id = state.issues[index].team.as_ref().map(|t| t.id.clone());
                let found = team_id
                    .and_then(|t| state.team(&t))
                    .and_then(|t| t.states.iter().find(|s| &s.id == state_id))
                    .cloned()
                    .ok_or_else(|| TrackerError::NotFound(format!("workflow state {}", state_id)))?;
                Some(found)
            }
            None => None,
        };
        let assignee = update
            .assignee_id
            .as_deref()
            .map(|id| state.user_ref(id))
            .transpose()?;
        let project = update
            .project_id
            .as_deref()
            .map(|id| state.project_ref(id))
            .transpose()?;
        let labels = update
            .label_ids
            .as_deref()
            .map(|ids| state.label_names(ids))
            .transpose()?;

        let issue = &mut state.issues[index];
        if let Some(title) = &update.title {
            issue.title = title.clone();
        }
        if let Some(description) = &update.description {
            issue.description = Some(description.clone());
        }
        if let Some(priority) = update.priority {
            issue.priority = priority;
            issue.priority_label = priority_label(priority).to_string();
        }
        if let Some(workflow) = workflow {
            issue.completed_at = workflow.is_closed().then(Utc::now);
            issue.state = Some(state_ref(&workflow));
        }
        if assignee.is_some() {
            issue.assignee = assignee;
        }
        if project.is_some() {
            issue.project = project;
        }
        if let Some(labels) = labels {
            issue.labels = labels;
        }
        if update.due_date.is_some() {
            issue.due_date = update.due_date;
        }
        if update.estimate.is_some() {
            issue.estimate = update.estimate;
        }
        issue.updated_at = Utc::now();
        Ok(issue.clone())
    }

    async fn list_comments(&self, issue_id: &str) -> Result<Vec<Comment>, TrackerError> {
        self.check()?;
        let state = self.state.lock();
        let index = state
            .issue_index(issue_id)
            .ok_or_else(|| TrackerError::NotFound(format!("issue {}", issue_id)))?;
        Ok(state
            .comments
            .get(&state.issues[index].id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_comment(&self, issue_id: &str, body: &str) -> Result<Comment, TrackerError> {
        self.check()?;
        if body.trim().is_empty() {
            return Err(TrackerError::InvalidRequest("comment body is empty".into()));
        }
        let mut state = self.state.lock();
        let index = state
            .issue_index(issue_id)
            .ok_or_else(|| TrackerError::NotFound(format!("issue {}", issue_id)))?;
        let key = state.issues[index].id.clone();
        let comment = Comment {
            id: state.next_id("comment"),
            body: body.to_string(),
            user: state.viewer.as_ref().map(|u| Ref::new(&u.id, &u.name)),
            created_at: Utc::now(),
        };
        state.comments.entry(key).or_default().push(comment.clone());
        Ok(comment)
    }

    async fn list_attachments(&self, issue_id: &str) -> Result<Vec<Attachment>, TrackerError> {
        self.check()?;
        let state = self.state.lock();
        let index = state
            .issue_index(issue_id)
            .ok_or_else(|| TrackerError::NotFound(format!("issue {}", issue_id)))?;
        Ok(state
            .attachments
            .get(&state.issues[index].id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_projects(&self, limit: u32) -> Result<Vec<Project>, TrackerError> {
        self.check()?;
        let state = self.state.lock();
        Ok(state.projects.iter().take(limit as usize).cloned().collect())
    }

    async fn get_project(&self, id: &str) -> Result<Project, TrackerError> {
        self.check()?;
        let state = self.state.lock();
        state
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(format!("project {}", id)))
    }

    async fn list_project_milestones(
        &self,
        project_id: &str,
    ) -> Result<Vec<ProjectMilestone>, TrackerError> {
        self.check()?;
        let state = self.state.lock();
        if !state.projects.iter().any(|p| p.id == project_id) {
            return Err(TrackerError::NotFound(format!("project {}", project_id)));
        }
        Ok(state.milestones.get(project_id).cloned().unwrap_or_default())
    }

    async fn list_labels(&self, team_id: Option<&str>) -> Result<Vec<Label>, TrackerError> {
        self.check()?;
        let state = self.state.lock();
        let team = match team_id {
            Some(id) => Some(
                state
                    .team(id)
                    .map(|t| t.id.clone())
                    .ok_or_else(|| TrackerError::NotFound(format!("team {}", id)))?,
            ),
            None => None,
        };
        Ok(state
            .labels
            .iter()
            .filter(|l| match (&team, &l.team) {
                (Some(want), Some(owner)) => &owner.id == want,
                (Some(_), None) => true,
                (None, _) => true,
            })
            .cloned()
            .collect())
    }

    async fn create_label(&self, draft: &LabelDraft) -> Result<Label, TrackerError> {
        self.check()?;
        let mut state = self.state.lock();
        if state
            .labels
            .iter()
            .any(|l| l.name.eq_ignore_ascii_case(&draft.name))
        {
            return Err(TrackerError::GraphQl(format!(
                "label \"{}\" already exists",
                draft.name
            )));
        }
        let team = match &draft.team_id {
            Some(id) => Some(
                state
                    .team(id)
                    .map(|t| Ref::new(&t.id, &t.name))
                    .ok_or_else(|| TrackerError::NotFound(format!("team {}", id)))?,
            ),
            None => None,
        };
        let label = Label {
            id: state.next_id("label"),
            name: draft.name.clone(),
            color: draft.color.clone().unwrap_or_else(|| "#bec2c8".into()),
            description: draft.description.clone(),
            team,
        };
        state.labels.push(label.clone());
        Ok(label)
    }
}
