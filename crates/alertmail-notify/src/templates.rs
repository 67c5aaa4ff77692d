// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handlebars templates for digest notifications.
//!
//! Subjects use triple-stash so tokens are not HTML-escaped; bodies use the
//! default escaping for all alert text.

use alertmail_core::AlertmailError;
use handlebars::Handlebars;

pub const DIGEST_SUBJECT: &str = "digest-subject";
pub const DIGEST_SUBJECT_UNRESOLVED: &str = "digest-subject-unresolved";
pub const DIGEST_BODY: &str = "digest-body";
pub const FALLBACK_SUBJECT: &str = "fallback-subject";
pub const FALLBACK_BODY: &str = "fallback-body";

const STYLE_PARTIAL: &str = "style";

const STYLE: &str = r#"<style>
    body { font-family: Arial, sans-serif; color: #333; background: #f5f5f5; margin: 0; padding: 20px; }
    .container { max-width: 800px; margin: 0 auto; background: #fff; border-radius: 8px; overflow: hidden; }
    .header { background: #dc3545; color: #fff; padding: 20px 30px; }
    .header.operator { background: #6f42c1; }
    .content { padding: 30px; }
    .summary { background: #f8f9fa; border-left: 4px solid #dc3545; padding: 15px 20px; margin-bottom: 25px; }
    .notice { background: #fff3cd; border: 1px solid #ffeaa7; padding: 15px 20px; margin-bottom: 25px; }
    .alert-item { border: 1px solid #e9ecef; border-radius: 6px; padding: 15px 20px; margin-bottom: 15px; }
    .alert-meta { color: #6c757d; font-size: 13px; }
    .recipient-group { margin-bottom: 30px; }
    .footer { background: #f8f9fa; color: #6c757d; font-size: 13px; padding: 15px 30px; text-align: center; }
</style>"#;

const DIGEST_BODY_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Alert digest</title>
    {{> style}}
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Alert digest</h1>
            <p>Generated at: {{generated_at}}</p>
        </div>
        <div class="content">
            {{#if unresolved}}
            <div class="notice">
                <h4>Recipient not found</h4>
                <p>No address is on file for <strong>{{recipient}}</strong>, so this digest was sent to the operator mailbox.</p>
                <p>Please check that:</p>
                <ul>
                    <li>the recipient identifier is spelled correctly</li>
                    <li>the directory file contains an entry for it</li>
                    <li>that entry has a valid email address</li>
                </ul>
            </div>
            {{/if}}
            <div class="summary">
                <h3>Summary</h3>
                <p><strong>Recipient:</strong> {{recipient}}</p>
                <p><strong>Window:</strong> {{window_start}} to {{window_end}}</p>
                <p><strong>Alerts:</strong> {{total}}</p>
            </div>
            <h3>Alerts</h3>
            {{#each alerts}}
            <div class="alert-item">
                <h4>Alert #{{number}}</h4>
                <p>{{message}}</p>
                <div class="alert-meta">Time: {{alert_time}}</div>
            </div>
            {{/each}}
        </div>
        <div class="footer">
            <p>Sent automatically by alertmail. Please follow up on the alerts above.</p>
        </div>
    </div>
</body>
</html>"#;

const FALLBACK_BODY_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Operator alert digest</title>
    {{> style}}
</head>
<body>
    <div class="container">
        <div class="header operator">
            <h1>Operator alert digest</h1>
            <p>Generated at: {{generated_at}}</p>
        </div>
        <div class="content">
            <div class="notice">
                <h4>Recipients not found</h4>
                <p>The following {{token_count}} recipient identifiers have no address on file: <strong>{{tokens}}</strong></p>
                <p>Add them to the directory file so future digests reach them directly.</p>
            </div>
            <div class="summary">
                <h3>Summary</h3>
                <p><strong>Affected recipients:</strong> {{token_count}}</p>
                <p><strong>Window:</strong> {{window_start}} to {{window_end}}</p>
                <p><strong>Alerts:</strong> {{total}}</p>
            </div>
            {{#each groups}}
            <div class="recipient-group">
                <h3>{{recipient}} ({{total}} alerts)</h3>
                {{#each alerts}}
                <div class="alert-item">
                    <h4>Alert #{{number}}</h4>
                    <p>{{message}}</p>
                    <div class="alert-meta">Time: {{alert_time}}</div>
                </div>
                {{/each}}
            </div>
            {{/each}}
        </div>
        <div class="footer">
            <p>Sent automatically by alertmail to the operator mailbox.</p>
        </div>
    </div>
</body>
</html>"#;

/// Registers every notification template. A syntax error here is a startup failure.
pub fn register_templates(registry: &mut Handlebars<'static>) -> Result<(), AlertmailError> {
    let templates = [
        (DIGEST_SUBJECT, "Alert digest - {{{recipient}}} - {{date}}"),
        (
            DIGEST_SUBJECT_UNRESOLVED,
            "[OPERATOR] Alert digest - {{{recipient}}} (recipient not found) - {{date}}",
        ),
        (DIGEST_BODY, DIGEST_BODY_TEMPLATE),
        (
            FALLBACK_SUBJECT,
            "[OPERATOR] Alert digest - {{{tokens}}} (recipients not found) - {{date}}",
        ),
        (FALLBACK_BODY, FALLBACK_BODY_TEMPLATE),
        (STYLE_PARTIAL, STYLE),
    ];
    for (name, source) in templates {
        registry
            .register_template_string(name, source)
            .map_err(|e| AlertmailError::Template {
                message: format!("registering {name} template"),
                source: Some(Box::new(e)),
            })?;
    }
    Ok(())
}

/// Name of the subject template for a digest.
pub fn digest_subject(resolved: bool) -> &'static str {
    if resolved {
        DIGEST_SUBJECT
    } else {
        DIGEST_SUBJECT_UNRESOLVED
    }
}
