//! Prompt composition for the elicitation agents.
//!
//! Every composer here is deterministic on its inputs: the same task
//! description, history, and options always produce the same request text.
//! Templates are module constants with `{var}` placeholders filled in by a
//! simple substitution pass.

use std::str::FromStr;

use tracing::debug;

use crate::error::{ElicitError, Result};
use crate::session::InteractionSession;
use crate::types::{ChatMessage, QuestionType};

const SINGLE_QUESTION_TEMPLATE: &str = "\
Your task is to {task_description}.

Previous questions:
{interaction_history}

Generate the most informative {question_kind} that, when answered, will \
reveal the most about the desired behavior beyond what has already been \
queried for above. Make sure your question addresses different aspects of \
the {implementation} than the questions that have already been asked. At \
the same time however, the question should be bite-sized, and not ask for \
too much at once. Generate the {question_kind} and nothing else:";

const MULTI_QUESTION_TEMPLATE: &str = "\
Your task is to {task_description}.

Previous questions:
{interaction_history}

Generate {num_candidates} candidate {question_kind}s that, when answered, \
will reveal the most about the desired behavior beyond what has already \
been queried for above. Make sure each question addresses different aspects \
of the {implementation} than the questions that have already been asked. At \
the same time however, the question should be bite-sized, and not ask for \
too much at once. List each question numbered on its own line and nothing \
else:";

const CHOOSE_QUESTION_TEMPLATE: &str = "\
Your task is to {task_description}.

Previous questions and answers:
{interaction_history}

Candidate questions:
{candidates}

Select the single most informative question from the list above and repeat \
it verbatim with nothing else.";

const HYPOTHESIS_TEMPLATE: &str = "\
Your task is to collaboratively help someone design a regex that will \
{task_description}.

Help them come up with a hypothesis for the regex that they should try, \
consistent with the previous questions and answers.

Previous questions and answers:
{interaction_history}

Previous invalid attempts (these regexes failed to compile):
{broken_attempts}

Generate the hypothesis regex without quotes and nothing else:";

/// Fill `{var}` placeholders in a template.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut rendered = template.to_string();
    for (key, value) in vars {
        let needle = format!("{{{}}}", key);
        rendered = rendered.replace(&needle, value);
    }
    rendered
}

/// Re-validate a question-type tag at composition time.
///
/// Agents validate the tag when they are constructed; this second check
/// keeps the composer safe when called directly with a raw config value.
fn parse_question_type(tag: &str) -> Result<QuestionType> {
    QuestionType::from_str(tag)
        .map_err(|_| ElicitError::Prompt(format!("unknown question type tag: {tag}")))
}

/// Compose the question-generation request.
///
/// With `num_candidates == 1` the instruction demands exactly one question
/// and nothing else; with more, it demands that many questions numbered one
/// per line so the parser can split them.
pub fn question_prompt(
    task_description: &str,
    question_type: &str,
    implementation: &str,
    session: &InteractionSession,
    num_candidates: usize,
) -> Result<Vec<ChatMessage>> {
    let question_kind = parse_question_type(question_type)?.describe();
    let history = session.render();

    let text = if num_candidates <= 1 {
        render(
            SINGLE_QUESTION_TEMPLATE,
            &[
                ("task_description", task_description),
                ("interaction_history", history.as_str()),
                ("question_kind", question_kind),
                ("implementation", implementation),
            ],
        )
    } else {
        let count = num_candidates.to_string();
        render(
            MULTI_QUESTION_TEMPLATE,
            &[
                ("task_description", task_description),
                ("interaction_history", history.as_str()),
                ("question_kind", question_kind),
                ("implementation", implementation),
                ("num_candidates", count.as_str()),
            ],
        )
    };

    debug!(target: "elicit::prompt", kind = "question", %text);
    Ok(vec![ChatMessage::user(text)])
}

/// Compose the best-candidate evaluator request over a 1-indexed list.
pub fn choose_prompt(
    task_description: &str,
    session: &InteractionSession,
    candidates: &[String],
) -> Vec<ChatMessage> {
    let numbered = candidates
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {}", i + 1, q))
        .collect::<Vec<_>>()
        .join("\n");

    let text = render(
        CHOOSE_QUESTION_TEMPLATE,
        &[
            ("task_description", task_description),
            ("interaction_history", session.render().as_str()),
            ("candidates", numbered.as_str()),
        ],
    );

    debug!(target: "elicit::prompt", kind = "choose", %text);
    vec![ChatMessage::user(text)]
}

/// Compose the replacement-hypothesis request, listing previously rejected
/// candidate regexes as negative context.
pub fn hypothesis_prompt(
    task_description: &str,
    session: &InteractionSession,
    broken_attempts: &[String],
) -> Vec<ChatMessage> {
    let broken = broken_attempts.join("\n");

    let text = render(
        HYPOTHESIS_TEMPLATE,
        &[
            ("task_description", task_description),
            ("interaction_history", session.render().as_str()),
            ("broken_attempts", broken.as_str()),
        ],
    );

    debug!(target: "elicit::prompt", kind = "hypothesis", %text);
    vec![ChatMessage::user(text)]
}

/// Compose the oracle request: the persona as system context plus the
/// question, with a brief format instruction for yes/no questions.
pub fn oracle_prompt(
    persona: &str,
    question: &str,
    question_type: Option<QuestionType>,
) -> Vec<ChatMessage> {
    let content = match question_type {
        Some(QuestionType::Yn) => {
            format!("{question}\n\nAnswer yes or no, with a brief explanation.")
        }
        _ => question.to_string(),
    };

    debug!(target: "elicit::prompt", kind = "oracle", question = %question);
    vec![ChatMessage::system(persona), ChatMessage::user(content)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(pairs: &[(&str, &str)]) -> InteractionSession {
        let mut session = InteractionSession::new();
        for (q, a) in pairs {
            session.append(*q, *a);
        }
        session
    }

    #[test]
    fn first_prompt_contains_seed_pair_and_no_real_question() {
        let session = InteractionSession::new();
        let messages =
            question_prompt("match all valid email addresses", "open", "regex", &session, 1)
                .unwrap();
        assert_eq!(messages.len(), 1);
        let text = &messages[0].content;
        assert!(text.contains("[Q]"));
        assert!(text.contains("[A]"));
        assert!(text.contains("match all valid email addresses"));
        assert!(text.contains("open-ended question"));
    }

    #[test]
    fn prompt_after_one_round_contains_answer_verbatim() {
        let session = session_with(&[(
            "Does it allow subdomains?",
            "No, it must allow subdomains.",
        )]);
        let messages =
            question_prompt("match all valid email addresses", "open", "regex", &session, 1)
                .unwrap();
        let text = &messages[0].content;
        assert!(text.contains("No, it must allow subdomains."));
        assert!(!text.contains("[Q]"));
    }

    #[test]
    fn multi_candidate_prompt_asks_for_the_requested_count() {
        let session = InteractionSession::new();
        let messages =
            question_prompt("match all valid email addresses", "yn", "regex", &session, 3)
                .unwrap();
        let text = &messages[0].content;
        assert!(text.contains("Generate 3 candidate yes/no questions"));
        assert!(text.contains("numbered on its own line"));
    }

    #[test]
    fn single_candidate_prompt_forbids_extra_text() {
        let session = InteractionSession::new();
        let messages =
            question_prompt("match all valid email addresses", "yn", "regex", &session, 1)
                .unwrap();
        assert!(messages[0].content.contains("and nothing else:"));
    }

    #[test]
    fn composition_rejects_unknown_tag_even_for_constructed_agents() {
        let session = InteractionSession::new();
        let err = question_prompt("match x", "essay", "regex", &session, 1).unwrap_err();
        assert!(matches!(err, ElicitError::Prompt(_)));
    }

    #[test]
    fn choose_prompt_numbers_candidates_from_one() {
        let session = InteractionSession::new();
        let candidates = vec!["First?".to_string(), "Second?".to_string()];
        let messages = choose_prompt("match x", &session, &candidates);
        let text = &messages[0].content;
        assert!(text.contains("1. First?"));
        assert!(text.contains("2. Second?"));
        assert!(text.contains("repeat it verbatim"));
    }

    #[test]
    fn hypothesis_prompt_lists_broken_attempts() {
        let session = session_with(&[("q", "a")]);
        let broken = vec!["[a-".to_string(), "(unclosed".to_string()];
        let messages = hypothesis_prompt("match x", &session, &broken);
        let text = &messages[0].content;
        assert!(text.contains("[a-\n(unclosed"));
        assert!(text.contains("failed to compile"));
    }

    #[test]
    fn oracle_prompt_appends_yn_instruction() {
        let messages = oracle_prompt("a pedantic admin", "Is foo allowed?", Some(QuestionType::Yn));
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "a pedantic admin");
        assert!(messages[1].content.starts_with("Is foo allowed?"));
        assert!(messages[1].content.contains("yes or no"));
    }

    #[test]
    fn oracle_prompt_passes_open_questions_through() {
        let messages = oracle_prompt("persona", "Describe the format.", Some(QuestionType::Open));
        assert_eq!(messages[1].content, "Describe the format.");
    }
}
