//! Prompt templates for the chat-completion generator.
//!
//! Both prompts ask for a single fenced ```json block so the reply can be
//! parsed without depending on the model's prose.

use crate::domain::session::{BaseInformation, Category, FINALIST_COUNT};

const REVEAL_TEMPLATE: &str = "\
你需要面向正在填报志愿的高中生，一针见血地揭示专业背后普通人通过大量努力可以获得的**正常收益**，\
以及与之对应的、严重但符合预期的**代价**。代价要具体到可量化的生活细节，符合高中生的认知。\
假设这名学生在大学四年中性格与习惯没有任何改变。

学生信息：
{infos}

请只输出一个 json 代码块，键为专业名，值为一句以「当……时，能否接受……？」为句式的描述：
```json
{\"专业A\": \"...\", \"专业B\": \"...\"}
```

需要揭示的两个专业：{first}, {second}";

const SUMMARY_TEMPLATE: &str = "\
一名高中生通过多轮二选一，最终留下了以下三个专业（按最近胜出顺序）：{finalists}

学生信息：
{infos}

请结合学生信息，为每个专业写一段客观的分析，并给出最终建议。只输出一个 json 代码块：
```json
{
  \"final_three_majors\": [\"专业1\", \"专业2\", \"专业3\"],
  \"final_three_majors_report\": [\"专业1的分析\", \"专业2的分析\", \"专业3的分析\"],
  \"final_recommendation\": \"最终建议\"
}
```";

/// Renders the questionnaire as `field: answer` lines.
pub fn render_infos(info: &BaseInformation) -> String {
    info.answers()
        .iter()
        .map(|(field, answer)| format!("- {}: {}", field, BaseInformation::display_answer(answer)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn reveal_prompt(info: &BaseInformation, first: &Category, second: &Category) -> String {
    REVEAL_TEMPLATE
        .replace("{infos}", &render_infos(info))
        .replace("{first}", first.as_str())
        .replace("{second}", second.as_str())
}

pub fn summary_prompt(info: &BaseInformation, finalists: &[Category; FINALIST_COUNT]) -> String {
    let names = finalists
        .iter()
        .map(Category::as_str)
        .collect::<Vec<_>>()
        .join("、");
    SUMMARY_TEMPLATE
        .replace("{finalists}", &names)
        .replace("{infos}", &render_infos(info))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::UNKNOWN_ANSWER;

    #[test]
    fn reveal_prompt_names_both_categories() {
        let prompt = reveal_prompt(
            &BaseInformation::default(),
            &Category::new("医学").unwrap(),
            &Category::new("文学").unwrap(),
        );
        assert!(prompt.contains("医学, 文学"));
        assert!(prompt.contains("```json"));
    }

    #[test]
    fn blank_answers_render_as_unknown() {
        let infos = render_infos(&BaseInformation::default());
        assert_eq!(infos.lines().count(), 10);
        assert!(infos.lines().all(|l| l.ends_with(UNKNOWN_ANSWER)));
    }

    #[test]
    fn summary_prompt_lists_finalists_in_order() {
        let finalists = [
            Category::new("数学类").unwrap(),
            Category::new("物理学类").unwrap(),
            Category::new("文学").unwrap(),
        ];
        let prompt = summary_prompt(&BaseInformation::default(), &finalists);
        assert!(prompt.contains("数学类、物理学类、文学"));
        assert!(prompt.contains("final_recommendation"));
    }
}
