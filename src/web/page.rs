use serde::Deserialize;
use std::fmt::Write;

use crate::ai_provider::Role;
use crate::core::risk::{MAX_EXERCISE_DAYS, MAX_SCREEN_HOURS, MAX_SLEEP_HOURS, MAX_WATER_GLASSES};
use crate::core::{RiskAssessment, StressLevel, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Scoring,
    Chat,
}

impl Mode {
    fn as_str(self) -> &'static str {
        match self {
            Mode::Scoring => "scoring",
            Mode::Chat => "chat",
        }
    }
}

/// Who is looking at the page and how. Passed in on every request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionContext {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub mode: Mode,
}

impl SessionContext {
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    fn link(&self, theme: Theme, mode: Mode) -> String {
        let user = self.username().map(urlencoding::encode).unwrap_or_default();
        format!("/?username={}&theme={}&mode={}", user, theme.as_str(), mode.as_str())
    }
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; display: flex; min-height: 100vh; }
body.light { background: #f7f9fc; color: #1c2430; }
body.dark { background: #0f1724; color: #e2e8f0; }
aside { width: 240px; padding: 1.5rem; border-right: 1px solid #8884; }
main { flex: 1; padding: 1.5rem 2.5rem; max-width: 860px; }
.warning { background: #fff3cd; color: #664d03; padding: .6rem 1rem; border-radius: 6px; }
.card { border: 1px solid #8884; border-radius: 10px; padding: 1rem 1.25rem; margin: 1rem 0; }
.bar { height: 14px; background: #3b82f6; border-radius: 4px; }
.score { font-size: 2.5rem; font-weight: 700; }
.narrative { white-space: pre-wrap; }
.msg { padding: .6rem .9rem; border-radius: 10px; margin: .4rem 0; white-space: pre-wrap; }
.msg.user { background: #3b82f622; text-align: right; }
.msg.assistant { background: #10b98122; }
label { display: block; margin-top: .75rem; }
input[type=range] { width: 100%; }
.error { color: #dc2626; }
"#;

const SCRIPT: &str = r#"
async function postJson(url, body) {
  const res = await fetch(url, { method: 'POST', headers: { 'content-type': 'application/json' }, body: JSON.stringify(body) });
  const json = await res.json();
  if (!res.ok) throw new Error(json.error || res.statusText);
  return json;
}
function showError(e) { document.getElementById('status').textContent = e.message; }
async function analyze(form) {
  document.getElementById('status').textContent = 'AI analyzing...';
  const f = new FormData(form);
  try {
    await postJson('/api/analyze', {
      username: f.get('username'), sleep: +f.get('sleep'), exercise: +f.get('exercise'),
      water: +f.get('water'), screen: +f.get('screen'), stress: f.get('stress')
    });
    location.reload();
  } catch (e) { showError(e); }
  return false;
}
async function sendChat(form) {
  document.getElementById('status').textContent = 'Thinking...';
  const f = new FormData(form);
  try {
    await postJson('/api/chat', { username: f.get('username'), message: f.get('message') });
    location.reload();
  } catch (e) { showError(e); }
  return false;
}
"#;

pub fn render(session: &SessionContext, profile: Option<&UserProfile>, model: &str) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>AI Health Intelligence</title>\
         <style>{}</style><script>{}</script></head><body class=\"{}\">",
        STYLE,
        SCRIPT,
        session.theme.as_str()
    );

    render_sidebar(&mut html, session);

    html.push_str("<main><h1>AI Health Intelligence System</h1>");
    html.push_str("<p class=\"warning\">Educational demo only. Not medical advice.</p>");

    match (session.username(), profile) {
        (Some(username), Some(profile)) => match session.mode {
            Mode::Scoring => render_scoring(&mut html, username, profile),
            Mode::Chat => render_chat(&mut html, username, profile),
        },
        _ => html.push_str("<p>Enter a username in the sidebar to begin.</p>"),
    }

    let _ = write!(
        html,
        "<p id=\"status\" class=\"error\"></p><footer><small>Model: {}</small></footer></main></body></html>",
        escape(model)
    );
    html
}

fn render_sidebar(html: &mut String, session: &SessionContext) {
    html.push_str("<aside><h3>User Profile</h3>");
    let _ = write!(
        html,
        "<form method=\"get\" action=\"/\">\
         <input name=\"username\" placeholder=\"Enter Username\" value=\"{}\">\
         <input type=\"hidden\" name=\"theme\" value=\"{}\">\
         <input type=\"hidden\" name=\"mode\" value=\"{}\">\
         <button>Log in</button></form>",
        escape(session.username().unwrap_or_default()),
        session.theme.as_str(),
        session.mode.as_str()
    );

    if let Some(username) = session.username() {
        let _ = write!(html, "<p>Logged in as {}</p>", escape(username));
        let _ = write!(
            html,
            "<h3>Select Mode</h3><p><a href=\"{}\">AI Risk Scoring</a></p>\
             <p><a href=\"{}\">AI Health Chat Assistant</a></p>",
            session.link(session.theme, Mode::Scoring),
            session.link(session.theme, Mode::Chat)
        );
    }

    let _ = write!(
        html,
        "<p><a href=\"{}\">Switch to {} theme</a></p></aside>",
        session.link(session.theme.toggled(), session.mode),
        session.theme.toggled().as_str()
    );
}

fn render_scoring(html: &mut String, username: &str, profile: &UserProfile) {
    let inputs = profile.inputs_or_default();

    html.push_str("<h2>Lifestyle Input</h2>");
    let _ = write!(
        html,
        "<form onsubmit=\"return analyze(this)\"><input type=\"hidden\" name=\"username\" value=\"{}\">",
        escape(username)
    );
    slider(html, "sleep", "Sleep (hours)", inputs.sleep_hours, MAX_SLEEP_HOURS);
    slider(html, "exercise", "Exercise (days/week)", inputs.exercise_days, MAX_EXERCISE_DAYS);
    slider(html, "water", "Water (glasses/day)", inputs.water_glasses, MAX_WATER_GLASSES);
    slider(html, "screen", "Screen Time (hours/day)", inputs.screen_hours, MAX_SCREEN_HOURS);

    html.push_str("<label>Stress Level <select name=\"stress\">");
    for level in StressLevel::ALL {
        let selected = if level == inputs.stress_level { " selected" } else { "" };
        let _ = write!(html, "<option{}>{}</option>", selected, level);
    }
    html.push_str("</select></label><p><button>Analyze Health Risk</button></p></form>");

    if let Some(last_inputs) = profile.last_inputs {
        let local = RiskAssessment::local(&last_inputs);
        render_breakdown(html, &local, profile.last_model_score);
    }

    if profile.has_result() {
        let _ = write!(
            html,
            "<div class=\"card\"><h3>Last Saved Assessment</h3><div class=\"narrative\">{}</div></div>",
            escape(&profile.last_result)
        );
    }
}

fn render_breakdown(html: &mut String, assessment: &RiskAssessment, model_score: Option<u32>) {
    let _ = write!(
        html,
        "<div class=\"card\"><h3>Local Risk Estimate</h3><div class=\"score\">{} <small>{}</small></div>",
        assessment.total_score, assessment.level
    );
    match model_score {
        Some(score) => {
            let _ = write!(html, "<p>AI declared score: {}</p>", score);
        }
        None => html.push_str("<p>AI reply carried no score.</p>"),
    }

    html.push_str("<table>");
    for (name, value) in assessment.component_scores.iter() {
        let width = value.clamp(0, 30) * 100 / 30;
        let _ = write!(
            html,
            "<tr><td>{}</td><td style=\"width:300px\"><div class=\"bar\" style=\"width:{}%\"></div></td><td>{}</td></tr>",
            name, width, value
        );
    }
    html.push_str("</table></div>");
}

fn render_chat(html: &mut String, username: &str, profile: &UserProfile) {
    html.push_str("<h2>Personal AI Health Assistant</h2><div class=\"card\">");
    if profile.chat_history.is_empty() {
        html.push_str("<p>No messages yet.</p>");
    }
    for message in &profile.chat_history {
        let class = match message.role {
            Role::User => "user",
            Role::Assistant | Role::System => "assistant",
        };
        let _ = write!(html, "<div class=\"msg {}\">{}</div>", class, escape(&message.content));
    }
    let _ = write!(
        html,
        "</div><form onsubmit=\"return sendChat(this)\"><input type=\"hidden\" name=\"username\" value=\"{}\">\
         <input name=\"message\" style=\"width:80%\" placeholder=\"Ask something about your health...\">\
         <button>Send</button></form>",
        escape(username)
    );
}

fn slider(html: &mut String, name: &str, label: &str, value: u32, max: u32) {
    let _ = write!(
        html,
        "<label>{label}: <output>{value}</output>\
         <input type=\"range\" name=\"{name}\" min=\"0\" max=\"{max}\" value=\"{value}\" \
         oninput=\"this.previousElementSibling.value=this.value\"></label>"
    );
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
