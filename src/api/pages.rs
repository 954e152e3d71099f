//! HTML pages served to browsers
//!
//! Job ids are restricted to `[A-Za-z0-9-]`, so they are interpolated
//! without escaping.

use crate::job::JobId;

const STYLE: &str = "<style>body{font-size:x-large;margin:2em auto;max-width:50%}</style>";

/// Seconds between reloads of the pending page
pub const PENDING_REFRESH_SECS: u32 = 10;

/// Seconds before the accepted page redirects to the job page
pub const ACCEPTED_REDIRECT_SECS: u32 = 5;

pub fn submit_form() -> String {
    format!(
        r#"<!doctype html>
<head><title>Download job submit form</title><meta charset=utf-8>
{STYLE}
<body>
<form method=post autocomplete=off>
<label for=url>YouTube url<br>(<samp>https://youtu.be/XXXXX</samp> or
<samp>https://www.youtube.com/watch?v=XXXXX</samp>)<br></label>
<input id=url type=url name=url placeholder="https://www.youtube.com/watch?v=dQw4w9WgXcQ"
	title="YouTube video page URL"
	pattern="https://(youtu.be|www.youtube.com)/.+"
	size=60 autofocus required>
<input type=submit></form>
"#
    )
}

pub fn accepted(id: &JobId) -> String {
    format!(
        r#"<!doctype html>
<head><meta http-equiv="refresh" content="{ACCEPTED_REDIRECT_SECS};url=/{id}">
{STYLE}
</head><body>
<p>Job queued, results will be available at <a href="/{id}">/{id}</a>
"#
    )
}

pub fn pending(ahead: usize) -> String {
    format!(
        r#"<!doctype html>
<head><meta http-equiv="refresh" content="{PENDING_REFRESH_SECS}">
{STYLE}
</head><body>
<p>{ahead} job(s) in queue, please wait. This page will refresh automatically.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_links_to_job() {
        let id = JobId::parse("dQw4w9WgXcQ").unwrap();
        let page = accepted(&id);

        assert!(page.contains(r#"content="5;url=/dQw4w9WgXcQ""#));
        assert!(page.contains(r#"<a href="/dQw4w9WgXcQ">"#));
    }

    #[test]
    fn test_pending_reports_jobs_ahead() {
        let page = pending(3);

        assert!(page.contains("3 job(s) in queue"));
        assert!(page.contains(r#"content="10""#));
    }

    #[test]
    fn test_form_posts_url_field() {
        let page = submit_form();
        assert!(page.contains("method=post"));
        assert!(page.contains("name=url"));
    }
}
