//! Notification templates and the placeholder renderer.
//!
//! Templates are compiled into the binary and selected by event kind, with
//! everything unrecognised falling back to the default template. The wire
//! format is literal `{{token}}` placeholders plus `{% if ... %}`/`{% endif %}`
//! markers around optional sections; when the corresponding value is empty the
//! whole section is turned into an HTML comment.

static BIRTHDAY_TEMPLATE: &str = include_str!("../templates/birthday.html");
static ANNIVERSARY_TEMPLATE: &str = include_str!("../templates/anniversary.html");
static DEFAULT_TEMPLATE: &str = include_str!("../templates/default.html");

/// Resolve the notification template for an event kind
pub fn template(event_type: &str) -> &'static str {
    match event_type.to_lowercase().as_str() {
        "birthday" => BIRTHDAY_TEMPLATE,
        "anniversary" => ANNIVERSARY_TEMPLATE,
        _ => DEFAULT_TEMPLATE,
    }
}

/// Resolve the subject line for an event kind
pub fn subject(event_type: &str, event_name: &str) -> String {
    match event_type.to_lowercase().as_str() {
        "birthday" => format!("🎂 Birthday Reminder: {event_name}"),
        "anniversary" => format!("💍 Anniversary Reminder: {event_name}"),
        _ => format!("📅 Event Reminder: {event_name}"),
    }
}

/// Values substituted into a notification template
#[derive(Debug, Clone)]
pub struct ReminderContext {
    pub event_name: String,
    pub event_date: String,
    pub event_type: String,
    pub event_time: Option<String>,
    pub notes: Option<String>,
    pub logo_url: String,
    pub app_url: String,
}

/// Comment out the first `{% if name %}` ... `{% endif %}` block when the
/// value is empty, or strip the markers when it is present.
///
/// Blocks resolve in template order, each consuming the next unmatched
/// `{% endif %}`.
fn resolve_conditional(html: &str, name: &str, present: bool) -> String {
    let open = format!("{{% if {name} %}}");
    let (open_replacement, close_replacement) = if present { ("", "") } else { ("<!--", "-->") };

    html.replacen(&open, open_replacement, 1)
        .replacen("{% endif %}", close_replacement, 1)
}

/// Substitute all placeholders in a template
pub fn render(template: &str, context: &ReminderContext) -> String {
    let mut html = template
        .replace("{{eventName}}", &context.event_name)
        .replace("{{eventDate}}", &context.event_date)
        .replace("{{eventType}}", &context.event_type)
        .replace("{{logoUrl}}", &context.logo_url)
        .replace("{{appUrl}}", &context.app_url);

    for (name, value) in [
        ("eventTime", context.event_time.as_deref()),
        ("notes", context.notes.as_deref()),
    ] {
        let value = value.unwrap_or("");
        html = html
            .replace(&format!("{{{{{name}}}}}"), value)
            .replace(&format!("{{{{ {name} }}}}"), value);
        html = resolve_conditional(&html, name, !value.is_empty());
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ReminderContext {
        ReminderContext {
            event_name: "Mum's Birthday".to_string(),
            event_date: "05/15".to_string(),
            event_type: "birthday".to_string(),
            event_time: None,
            notes: None,
            logo_url: "http://localhost:3000/assets/bell.png".to_string(),
            app_url: "http://localhost:3000".to_string(),
        }
    }

    #[test]
    fn templates_resolve_by_kind_with_default_fallback() {
        assert!(template("birthday").contains("Birthday Reminder"));
        assert!(template("anniversary").contains("Anniversary Reminder"));
        assert!(template("appointment").contains("Event Reminder"));
        assert!(template("something-unrecognised").contains("Event Reminder"));
        assert!(template("BIRTHDAY").contains("Birthday Reminder"));
    }

    #[test]
    fn subjects_carry_the_event_name() {
        assert_eq!(
            subject("birthday", "Mum's Birthday"),
            "🎂 Birthday Reminder: Mum's Birthday"
        );
        assert_eq!(
            subject("anniversary", "Our Anniversary"),
            "💍 Anniversary Reminder: Our Anniversary"
        );

        let fallback = subject("garden-party", "Team Meeting");
        assert!(fallback.contains("Event Reminder"));
        assert!(fallback.contains("Team Meeting"));
    }

    #[test]
    fn all_templates_carry_the_required_placeholders() {
        for template in [BIRTHDAY_TEMPLATE, ANNIVERSARY_TEMPLATE, DEFAULT_TEMPLATE] {
            for placeholder in ["{{eventName}}", "{{eventDate}}", "{{logoUrl}}", "{{appUrl}}"] {
                assert!(template.contains(placeholder), "missing {placeholder}");
            }
        }
    }

    #[test]
    fn placeholders_are_substituted() {
        let html = render(template("birthday"), &context());

        assert!(html.contains("Mum's Birthday"));
        assert!(html.contains("05/15"));
        assert!(html.contains("http://localhost:3000/assets/bell.png"));
        assert!(!html.contains("{{eventName}}"));
        assert!(!html.contains("{{eventDate}}"));
    }

    #[test]
    fn empty_optional_sections_degrade_to_comments() {
        let html = render(template("default"), &context());

        // Both optional blocks commented out, with their tokens emptied
        assert_eq!(html.matches("<!--").count(), 2);
        assert_eq!(html.matches("-->").count(), 2);
        assert!(!html.contains("{% if"));
        assert!(!html.contains("{% endif %}"));
        assert!(!html.contains("{{eventTime}}"));
        assert!(!html.contains("{{notes}}"));
    }

    #[test]
    fn present_optional_sections_keep_their_content() {
        let mut context = context();
        context.event_time = Some("14:30".to_string());
        context.notes = Some("Bring flowers".to_string());

        let html = render(template("default"), &context);

        assert!(html.contains("14:30"));
        assert!(html.contains("Bring flowers"));
        assert!(!html.contains("<!--"));
        assert!(!html.contains("{% if"));
    }

    #[test]
    fn a_lone_present_section_does_not_steal_the_wrong_endif() {
        let mut context = context();
        context.event_time = Some("09:00".to_string());

        let html = render(template("default"), &context);

        assert!(html.contains("09:00"));
        // The notes block is the one commented out
        assert_eq!(html.matches("<!--").count(), 1);
        assert_eq!(html.matches("-->").count(), 1);
    }
}
