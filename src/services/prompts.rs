//! 提示词模板
//!
//! 每个模板的末尾都附带字段的 JSON 骨架，首次调用就要求模型返回 JSON。

use crate::models::{ExamQuestion, QuestionGenerateRequest, QuestionType, ScoreJudgmentInput};
use crate::structured::OutputSchema;

/// 所有请求共用的系统消息
pub const SYSTEM_MESSAGE: &str = "你只输出一个符合要求的 JSON 对象，不要输出任何解释性文字。";

const VERIFY_ROLE: &str = "你是一位严谨的命题审核专家，负责核查考试题目是否合规，并在不合规时给出具体、可执行的修正意见。";

const FIX_ROLE: &str = "你是一位经验丰富的命题专家，负责根据审核意见修正考试题目，修正后的题目必须完整、正确、符合题型规范。";

const GRADING_CRITERIA_ROLE: &str = "你是一位资深阅卷组长，负责为主观题设计清晰、可操作的评分细则。";

const SCORE_ROLE: &str = "你是一位公正的阅卷老师，严格依据标准答案和评分细则给考生答案打分。";

const GENERATE_ROLE: &str = "你是一位专业的课程考题生成专家，生成的题目紧扣知识点，答案准确，解析符合大学课程水平。";

const SETTINGS_ROLE: &str = "你是一位专业的考试管理专家，擅长从文本中准确提取考试相关的设置信息。";

/// 各题型的核查要点
fn verification_focus(question_type: QuestionType) -> &'static str {
    match question_type {
        QuestionType::SingleChoice => {
            "- 选项是否完整且有且只有一个正确答案\n- 干扰项是否合理，答案与解析是否一致"
        }
        QuestionType::MultiChoice => {
            "- 选项是否完整且至少有两个正确答案\n- 答案是否列出全部正确选项，解析是否逐项说明"
        }
        QuestionType::FillBlank => {
            "- 空白处是否明确，答案是否简洁且唯一\n- 题干不应要求考生写出推导过程"
        }
        QuestionType::BriefAnswer => {
            "- 设问是否清晰，答案是否覆盖全部要点\n- 解析是否说明得分要点"
        }
        QuestionType::Calculation => {
            "- 已知条件是否充分，数值是否自洽\n- 答案计算是否正确，解析步骤是否完整"
        }
        QuestionType::Programming => {
            "- 输入输出要求与边界条件是否明确\n- 参考答案代码是否正确，解析是否说明思路与复杂度"
        }
    }
}

pub fn verification_prompt(question: &ExamQuestion, schema: &OutputSchema) -> String {
    format!(
        r#"{role}

请核查以下{question_type}是否合规：

【题目】
{question}

【答案】
{answer}

【答案解析】
{analysis}

【知识点】{knowledge_point}
【知识点描述】{knowledge_point_description}
【额外要求】{extra_requirement}

核查要点：
{focus}
- 题目、答案、解析三者是否一致，是否符合知识点
- 若有额外要求，题目是否已满足额外要求

若合规，is_compliant 为 true；否则为 false，并在 suggestion 中逐项给出修正意见。
请以如下JSON格式返回：
{format}"#,
        role = VERIFY_ROLE,
        question_type = question.question_type,
        question = question.question,
        answer = question.answer,
        analysis = question.answer_analysis,
        knowledge_point = or_none(&question.knowledge_point),
        knowledge_point_description = or_none(&question.knowledge_point_description),
        extra_requirement = or_none(&question.extra_requirement),
        focus = verification_focus(question.question_type),
        format = schema.format_hint(),
    )
}

pub fn fix_prompt(question: &ExamQuestion, suggestion: &str, schema: &OutputSchema) -> String {
    format!(
        r#"{role}

请根据修正意见修正以下考试题目：

【题目类型】{question_type}
【题目】
{question}

【答案】
{answer}

【答案解析】
{analysis}

【知识点】{knowledge_point}
【知识点描述】{knowledge_point_description}
【额外要求】{extra_requirement}

【修正意见】
{suggestion}

若额外要求改变了题型，question_type 填写新的题型（单选题、多选题、填空题、简答题、计算题、编程题之一）。
请以如下JSON格式返回修正后的完整题目：
{format}"#,
        role = FIX_ROLE,
        question_type = question.question_type,
        question = question.question,
        answer = question.answer,
        analysis = question.answer_analysis,
        knowledge_point = or_none(&question.knowledge_point),
        knowledge_point_description = or_none(&question.knowledge_point_description),
        extra_requirement = or_none(&question.extra_requirement),
        suggestion = suggestion,
        format = schema.format_hint(),
    )
}

pub fn grading_criteria_prompt(input: &ScoreJudgmentInput, schema: &OutputSchema) -> String {
    format!(
        r#"{role}

【题目类型】{question_type}
【满分】{full_score}
【题目】
{title}

【标准答案】
{standard_answer}

请设计评分细则：列出得分点及分值（总分等于满分），以及常见扣分情形。
请以如下JSON格式返回：
{format}"#,
        role = GRADING_CRITERIA_ROLE,
        question_type = input.question_type,
        full_score = input.full_score,
        title = input.question_title,
        standard_answer = input.standard_answer,
        format = schema.format_hint(),
    )
}

pub fn score_prompt(input: &ScoreJudgmentInput, criteria: &str, schema: &OutputSchema) -> String {
    format!(
        r#"{role}

【题目类型】{question_type}
【满分】{full_score}
【题目】
{title}

【标准答案】
{standard_answer}

【评分细则】
{criteria}

【考生答案】
{student_answer}

score 为 0 到 {full_score} 之间的整数，sj_reason 说明得分与扣分依据。
请以如下JSON格式返回：
{format}"#,
        role = SCORE_ROLE,
        question_type = input.question_type,
        full_score = input.full_score,
        title = input.question_title,
        standard_answer = input.standard_answer,
        criteria = criteria,
        student_answer = input.student_answer,
        format = schema.format_hint(),
    )
}

pub fn settings_prompt(text_content: &str, schema: &OutputSchema) -> String {
    format!(
        r#"{role}

请从以下文本中提取考试设置信息：

{text}

字段说明（文本中没有的信息设置为 null）：
- exam_time：考试时间，格式 "YYYY-MM-DD HH:MM-HH:MM"
- duration：考试时长，格式 "HH小时MM分钟"
- early_entry_time：允许提前入场的分钟数，例如 "15"
- late_entry_deadline：开考后禁止入场的分钟数，例如 "10"
- submission_time_setting：考试剩余多少分钟后可以交卷，例如 "30"
- passing_score_percentage：及格分数百分比，例如 "60%"

请以如下JSON格式返回：
{format}"#,
        role = SETTINGS_ROLE,
        text = text_content,
        format = schema.format_hint(),
    )
}

/// 出题提示词
///
/// 一次只生成一道题；`previous` 为本请求已生成的题干，要求新题不重复。
pub fn generation_prompt(
    request: &QuestionGenerateRequest,
    index: u32,
    total: u32,
    previous: &[String],
    schema: &OutputSchema,
) -> String {
    let knowledge_points = if request.knowledge_points.is_empty() {
        "未提供".to_string()
    } else {
        request
            .knowledge_points
            .iter()
            .enumerate()
            .map(|(i, point)| format!("{}. {}", i + 1, point))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let question_type = request
        .question_type
        .map(|t| t.label())
        .unwrap_or("未提供");
    let count = if request.count > 0 {
        request.count.to_string()
    } else {
        "未提供".to_string()
    };
    let previous = if previous.is_empty() {
        "无".to_string()
    } else {
        previous
            .iter()
            .map(|stem| format!("- {}", stem))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"{role}

结构化输入信息：
- 课程名称：{topic}
- 知识点：
{knowledge_points}
- 题型：{question_type}
- 题目数量：{count}
- 难度：{difficulty}

用户自定义需求描述：
{description}

要求：
1. 综合分析以上所有信息，结构化输入与需求描述冲突时以需求描述为准
2. 需求描述中没有提到的信息，使用结构化输入中的对应信息
3. 现在生成第 {index}/{total} 道题，只生成这一道
4. 不要与已生成的题目重复：
{previous}
5. 每道题必须附带详细的答案解析
6. question_type 为单选题、多选题、填空题、简答题、计算题、编程题之一

请以如下JSON格式返回：
{format}"#,
        role = GENERATE_ROLE,
        topic = or_missing(&request.topic),
        knowledge_points = knowledge_points,
        question_type = question_type,
        count = count,
        difficulty = request.difficulty,
        description = or_missing(&request.description),
        index = index,
        total = total,
        previous = previous,
        format = schema.format_hint(),
    )
}

fn or_missing(value: &str) -> &str {
    if value.is_empty() {
        "未提供"
    } else {
        value
    }
}

fn or_none(value: &str) -> &str {
    if value.is_empty() {
        "无"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(question_type: QuestionType) -> ExamQuestion {
        ExamQuestion {
            question: "在求解无权图最短路径时为什么使用 BFS？".to_string(),
            answer: "BFS 按层扩展".to_string(),
            question_type,
            answer_analysis: "首次到达即最短".to_string(),
            knowledge_point: String::new(),
            knowledge_point_description: String::new(),
            extra_requirement: "将简答题修改为填空题".to_string(),
        }
    }

    #[test]
    fn test_verification_prompt_contains_question_and_format() {
        let schema = OutputSchema::new().boolean("is_compliant").optional_string("suggestion");
        let prompt = verification_prompt(&question(QuestionType::BriefAnswer), &schema);

        assert!(prompt.contains("请核查以下简答题是否合规"));
        assert!(prompt.contains("BFS 按层扩展"));
        assert!(prompt.contains("【知识点】无"));
        assert!(prompt.contains("将简答题修改为填空题"));
        assert!(prompt.contains("\"is_compliant\": true/false"));
    }

    #[test]
    fn test_each_type_has_focus() {
        for question_type in [
            QuestionType::SingleChoice,
            QuestionType::MultiChoice,
            QuestionType::FillBlank,
            QuestionType::BriefAnswer,
            QuestionType::Calculation,
            QuestionType::Programming,
        ] {
            assert!(verification_focus(question_type).starts_with("- "));
        }
    }

    #[test]
    fn test_generation_prompt_lists_inputs_and_previous() {
        let schema = OutputSchema::new().string("question");
        let request = QuestionGenerateRequest {
            topic: "数据结构".to_string(),
            knowledge_points: vec!["栈".to_string(), "队列".to_string()],
            question_type: Some(QuestionType::SingleChoice),
            count: 2,
            ..Default::default()
        };
        let prompt = generation_prompt(&request, 2, 2, &["栈的特点是什么？".to_string()], &schema);

        assert!(prompt.contains("- 课程名称：数据结构"));
        assert!(prompt.contains("1. 栈\n2. 队列"));
        assert!(prompt.contains("- 题型：单选题"));
        assert!(prompt.contains("- 难度：一般"));
        assert!(prompt.contains("用户自定义需求描述：\n未提供"));
        assert!(prompt.contains("第 2/2 道题"));
        assert!(prompt.contains("- 栈的特点是什么？"));
        assert!(prompt.contains("\"question\": \"<字符串>\""));
    }

    #[test]
    fn test_fix_prompt_contains_suggestion() {
        let schema = OutputSchema::new().string("question");
        let prompt = fix_prompt(&question(QuestionType::BriefAnswer), "改为填空题格式", &schema);
        assert!(prompt.contains("【修正意见】\n改为填空题格式"));
    }
}
