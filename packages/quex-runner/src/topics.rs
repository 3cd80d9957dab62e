use std::{fs, path::Path};

use crate::{Error, Result};

/// One parsed TREC topic, in file order.
#[derive(Debug, Clone, Default)]
pub struct Topic {
	pub number: u32,
	pub title: String,
	pub description: String,
	pub narrative: String,
}

/// Which topic fields form the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
	Title,
	TitlePlusDescription,
	TitlePlusNarrative,
}

impl QueryMode {
	pub fn parse(name: &str) -> Result<Self> {
		match name {
			"title" => Ok(Self::Title),
			"title-plus-description" => Ok(Self::TitlePlusDescription),
			"title-plus-narrative" => Ok(Self::TitlePlusNarrative),
			_ => Err(Error::UnknownQueryMode { name: name.to_string() }),
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			Self::Title => "title",
			Self::TitlePlusDescription => "title-plus-description",
			Self::TitlePlusNarrative => "title-plus-narrative",
		}
	}
}

impl Topic {
	pub fn query_text(&self, mode: QueryMode) -> String {
		match mode {
			QueryMode::TitlePlusDescription => format!("{} {}", self.title, self.description),
			QueryMode::Title | QueryMode::TitlePlusNarrative => self.title.clone(),
		}
	}

	/// Assessor instructions for scorer prompts: only the narrative mode
	/// forwards them.
	pub fn instructions(&self, mode: QueryMode) -> Option<&str> {
		match mode {
			QueryMode::TitlePlusNarrative if !self.narrative.is_empty() =>
				Some(self.narrative.as_str()),
			_ => None,
		}
	}
}

/// Parse classic SGML-ish TREC topics: `<num>`, `<title>`, `<desc>` (same
/// line or the next), a multi-line `<narr>` running until the next tag, and
/// `</top>` closing the topic. Topics come back in original file order.
pub fn parse_topics(path: &Path) -> Result<Vec<Topic>> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadTopics { path: path.to_path_buf(), source: err })?;

	Ok(parse_topics_str(&raw))
}

fn parse_topics_str(raw: &str) -> Vec<Topic> {
	let lines = raw.lines().collect::<Vec<_>>();
	let mut topics = Vec::new();
	let mut topic: Option<Topic> = None;
	let mut narrative: Option<String> = None;
	let mut cursor = 0;

	while cursor < lines.len() {
		let line = lines[cursor];
		let trimmed = line.trim();

		cursor += 1;

		// Any new tag ends a running narrative block.
		if trimmed.starts_with('<')
			&& !trimmed.starts_with("</top>")
			&& let Some(text) = narrative.take()
			&& let Some(topic) = topic.as_mut()
		{
			topic.narrative = text.trim().to_string();
		}

		if trimmed.starts_with("<num>") {
			let number = trimmed
				.chars()
				.filter(char::is_ascii_digit)
				.collect::<String>()
				.parse()
				.unwrap_or(0);

			topic = Some(Topic { number, ..Topic::default() });
		} else if trimmed.starts_with("<title>") {
			if let Some(topic) = topic.as_mut() {
				topic.title =
					line.replace("<title>", "").replace("Topic:", "").trim().to_string();
			}
		} else if trimmed.starts_with("<desc>") {
			let same_line = line.replace("<desc>", "").replace("Description:", "");
			let description = if same_line.trim().is_empty() {
				let next = lines.get(cursor).copied().unwrap_or_default();

				cursor += 1;
				next.replace("Description:", "")
			} else {
				same_line
			};

			if let Some(topic) = topic.as_mut() {
				topic.description = description.trim().to_string();
			}
		} else if trimmed.starts_with("<narr>") {
			let same_line = line.replace("<narr>", "").replace("Narrative:", "");

			narrative = Some(same_line.trim().to_string());
		} else if trimmed.starts_with("</top>") {
			if let Some(mut topic) = topic.take() {
				if let Some(text) = narrative.take() {
					topic.narrative = text.trim().to_string();
				}

				topics.push(topic);
			}
		} else if let Some(narrative) = narrative.as_mut()
			&& !trimmed.is_empty()
			&& trimmed != "Narrative:"
		{
			if !narrative.is_empty() {
				narrative.push(' ');
			}

			narrative.push_str(trimmed);
		}
	}

	topics
}

#[cfg(test)]
mod tests {
	use super::*;

	const TOPICS: &str = "\
<top>
<num> Number: 401
<title> foreign minorities, Germany

<desc> Description:
What language and cultural differences impede the integration of foreign minorities in Germany?

<narr> Narrative:
A relevant document will focus on
the causes of the lack of integration.

</top>
<top>
<num> Number: 402
<title> behavioral genetics
<desc> Description: What is happening in the field of behavioral genetics?
<narr>
Relevant documents discuss inherited behavior.
</top>
";

	#[test]
	fn parses_topics_in_file_order() {
		let topics = parse_topics_str(TOPICS);

		assert_eq!(topics.len(), 2);
		assert_eq!(topics[0].number, 401);
		assert_eq!(topics[1].number, 402);
	}

	#[test]
	fn strips_tag_and_label_prefixes() {
		let topics = parse_topics_str(TOPICS);

		assert_eq!(topics[0].title, "foreign minorities, Germany");
		assert_eq!(topics[1].title, "behavioral genetics");
	}

	#[test]
	fn reads_descriptions_on_the_same_or_next_line() {
		let topics = parse_topics_str(TOPICS);

		assert!(topics[0].description.starts_with("What language and cultural"));
		assert_eq!(
			topics[1].description,
			"What is happening in the field of behavioral genetics?"
		);
	}

	#[test]
	fn joins_multi_line_narratives_with_spaces() {
		let topics = parse_topics_str(TOPICS);

		assert_eq!(
			topics[0].narrative,
			"A relevant document will focus on the causes of the lack of integration."
		);
		assert_eq!(topics[1].narrative, "Relevant documents discuss inherited behavior.");
	}

	#[test]
	fn query_text_follows_the_mode() {
		let topics = parse_topics_str(TOPICS);
		let topic = &topics[1];

		assert_eq!(topic.query_text(QueryMode::Title), "behavioral genetics");
		assert!(
			topic
				.query_text(QueryMode::TitlePlusDescription)
				.contains("behavioral genetics What is happening")
		);
		assert!(topic.instructions(QueryMode::Title).is_none());
		assert!(topic.instructions(QueryMode::TitlePlusNarrative).is_some());
	}
}
