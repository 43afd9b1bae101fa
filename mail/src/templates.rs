/// A rendered email body, ready to pair with a recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// The email a prospective client receives when a freelancer invites them
/// to a project. Everything user-controlled is escaped before it lands in
/// the markup.
pub fn invite_email(project_name: &str, inviter_name: &str, redeem_url: &str) -> RenderedEmail {
    let project = escape_html(project_name);
    let inviter = escape_html(inviter_name);
    let url = escape_html(redeem_url);

    RenderedEmail {
        subject: format!("{inviter_name} invited you to {project_name}"),
        html: format!(
            r#"<p>{inviter} is using FreelanceDesk to run the project <strong>{project}</strong> and would like you to join as a client.</p>
<p><a href="{url}">Accept the invitation</a></p>
<p>The link expires in 14 days. If you were not expecting this email you can ignore it.</p>"#
        ),
    }
}
