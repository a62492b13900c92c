//! Author identity and sign-off consistency.

use commitguard_core::{CaseRecorder, Check, CheckDescriptor, PathHint, RunContext};
use regex::Regex;

pub const DESCRIPTOR: CheckDescriptor = CheckDescriptor {
    name: "Identity",
    path_hint: PathHint::RepoRoot,
    create,
};

const NOREPLY_SUFFIX: &str = "@users.noreply.github.com";

fn create() -> Box<dyn Check> {
    Box::new(Identity)
}

/// Checks every commit in the range for a usable author identity:
///
/// - the `Author:` line must appear among the `Signed-off-by:` trailers,
/// - the author name must be at least two words (`First Last <email>`),
/// - the address must not be a GitHub noreply address.
#[derive(Debug, Default)]
pub struct Identity;

impl Check for Identity {
    fn run(&mut self, ctx: &RunContext, case: &mut CaseRecorder) -> anyhow::Result<()> {
        let patterns = Patterns::new()?;
        let git = ctx.git();
        for sha in git.shas(ctx.commit_range())? {
            let text = git.commit_text(&sha)?;
            if let Some(problem) = patterns.inspect(&text) {
                case.failure(problem);
            }
        }
        Ok(())
    }
}

struct Patterns {
    commit: Regex,
    author: Regex,
    signed_off: Regex,
}

impl Patterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            commit: Regex::new(r"^commit\s(\S*)")?,
            author: Regex::new(r"^Author:\s(.*)")?,
            signed_off: Regex::new(r"(?i)signed-off-by:\s(.*)")?,
        })
    }

    fn inspect(&self, commit_text: &str) -> Option<String> {
        let mut sha = "";
        let mut author = "";
        let mut signed = Vec::new();
        for line in commit_text.lines() {
            if let Some(caps) = self.commit.captures(line) {
                sha = caps.get(1).map_or("", |m| m.as_str());
            }
            if let Some(caps) = self.author.captures(line) {
                author = caps.get(1).map_or("", |m| m.as_str());
            }
            if let Some(caps) = self.signed_off.captures(line) {
                signed.push(caps.get(1).map_or("", |m| m.as_str()));
            }
        }
        identity_problem(sha, author, &signed)
    }
}

/// Inspects one commit's `git log` text; returns the failure text, if any.
pub fn inspect_commit(commit_text: &str) -> Result<Option<String>, regex::Error> {
    Ok(Patterns::new()?.inspect(commit_text))
}

fn identity_problem(sha: &str, author: &str, signed: &[&str]) -> Option<String> {
    let not_signed = format!(
        "{sha}: author email ({author}) needs to match one of the signed-off-by entries."
    );
    let bad_syntax =
        format!("{sha}: author email ({author}) does not follow the syntax: First Last <email>.");
    let noreply = format!(
        "{sha}: author email ({author}) must be a real email and cannot end in {NOREPLY_SUFFIX}"
    );

    let mut problem = (!signed.contains(&author)).then_some(not_signed);

    let (name, address) = parse_address(author);
    if name.split(' ').count() < 2 {
        problem = Some(match problem {
            Some(p) => format!("{p}\n{bad_syntax}"),
            None => bad_syntax,
        });
    } else if address.ends_with(NOREPLY_SUFFIX) {
        // Overrides a sign-off mismatch.
        problem = Some(noreply);
    }

    problem
}

/// Splits `Name <address>` into its parts. Without angle brackets the whole
/// input is taken as the address.
pub fn parse_address(input: &str) -> (String, String) {
    let input = input.trim();
    match (input.find('<'), input.rfind('>')) {
        (Some(open), Some(close)) if open < close => (
            input[..open].trim().trim_matches('"').to_string(),
            input[open + 1..close].trim().to_string(),
        ),
        _ => (String::new(), input.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(author: &str, trailers: &[&str]) -> String {
        let mut text = format!(
            "commit 0123abcd (HEAD -> main)\nAuthor: {author}\nDate:   Mon Jan 5 10:00:00 2026 +0000\n\n    Add feature\n"
        );
        if !trailers.is_empty() {
            text.push('\n');
        }
        for t in trailers {
            text.push_str(&format!("    Signed-off-by: {t}\n"));
        }
        text
    }

    #[test]
    fn signed_off_author_passes() {
        let text = log(
            "Jane Doe <jane@example.com>",
            &["Jane Doe <jane@example.com>"],
        );
        assert_eq!(inspect_commit(&text).expect("regex"), None);
    }

    #[test]
    fn sign_off_is_matched_case_insensitively() {
        let text = log("Jane Doe <jane@example.com>", &[])
            + "\n    signed-off-by: Jane Doe <jane@example.com>\n";
        assert_eq!(inspect_commit(&text).expect("regex"), None);
    }

    #[test]
    fn missing_sign_off_fails() {
        let text = log("Jane Doe <jane@example.com>", &["Other Person <o@example.com>"]);
        assert_eq!(
            inspect_commit(&text).expect("regex").as_deref(),
            Some(
                "0123abcd: author email (Jane Doe <jane@example.com>) needs to match one of the signed-off-by entries."
            )
        );
    }

    #[test]
    fn single_word_name_appends_syntax_error() {
        let text = log("jane <jane@example.com>", &[]);
        let problem = inspect_commit(&text).expect("regex").expect("problem");
        let lines: Vec<_> = problem.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("needs to match one of the signed-off-by entries."));
        assert!(lines[1].ends_with("does not follow the syntax: First Last <email>."));
    }

    #[test]
    fn noreply_address_fails_even_when_signed() {
        let author = "Jane Doe <1234+jane@users.noreply.github.com>";
        let problem = inspect_commit(&log(author, &[author]))
            .expect("regex")
            .expect("problem");
        assert!(problem.ends_with("cannot end in @users.noreply.github.com"));
        assert_eq!(problem.lines().count(), 1);
    }

    #[test]
    fn parse_address_variants() {
        assert_eq!(
            parse_address("Jane Doe <jane@example.com>"),
            ("Jane Doe".to_string(), "jane@example.com".to_string())
        );
        assert_eq!(
            parse_address("\"Doe, Jane\" <jane@example.com>"),
            ("Doe, Jane".to_string(), "jane@example.com".to_string())
        );
        assert_eq!(
            parse_address("jane@example.com"),
            (String::new(), "jane@example.com".to_string())
        );
    }
}
