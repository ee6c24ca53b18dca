//! Canned messages shown to participants.
//!
//! Every fixed string a session can emit (acknowledgements, retry prompts,
//! time-up notice, completion-service failure replies) has a default per
//! language and can be overridden per task in the config file.
//! Templates use `{letters}`, `{item}` and `{detail}` placeholders.

use serde::{Deserialize, Serialize};

use crate::inference::errors::ErrorCategory;

/// Language of a task's fixed messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

/// Resolved message set for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMessages {
    pub completion_ack: String,
    pub time_up: String,
    pub chat_ended: String,
    pub start_prompt: String,
    pub retry_selection: String,
    pub step_ack: String,
    pub closing: String,
    pub empty_reply: String,
    pub shortlist_pending: String,
    pub shortlist_confirmed: String,
    pub no_pending_shortlist: String,
    pub error_authentication: String,
    pub error_rate_limited: String,
    pub error_connectivity: String,
    pub error_bad_request: String,
    pub error_unknown: String,
    letter_separator: &'static str,
}

/// Per-task overrides, all optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageOverrides {
    #[serde(default)]
    pub completion_ack: Option<String>,
    #[serde(default)]
    pub time_up: Option<String>,
    #[serde(default)]
    pub chat_ended: Option<String>,
    #[serde(default)]
    pub start_prompt: Option<String>,
    #[serde(default)]
    pub retry_selection: Option<String>,
    #[serde(default)]
    pub step_ack: Option<String>,
    #[serde(default)]
    pub closing: Option<String>,
    #[serde(default)]
    pub empty_reply: Option<String>,
    #[serde(default)]
    pub shortlist_pending: Option<String>,
    #[serde(default)]
    pub shortlist_confirmed: Option<String>,
    #[serde(default)]
    pub no_pending_shortlist: Option<String>,
    #[serde(default)]
    pub error_authentication: Option<String>,
    #[serde(default)]
    pub error_rate_limited: Option<String>,
    #[serde(default)]
    pub error_connectivity: Option<String>,
    #[serde(default)]
    pub error_bad_request: Option<String>,
    #[serde(default)]
    pub error_unknown: Option<String>,
}

impl TaskMessages {
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Zh => Self {
                completion_ack: "收到你的最终排序 ✅ 我们的协作到此结束，感谢参与！".into(),
                time_up: "⏰ 时间到，本次讨论已结束。感谢参与！".into(),
                chat_ended: "对话已结束。".into(),
                start_prompt: "请输入 **\"OK\"** 开始。".into(),
                retry_selection: "请从提供的物品中选择一个尚未选择过的物品。".into(),
                step_ack: "已记录：{item}。".into(),
                closing: "所有物品都已选择完毕，感谢参与！本次对话到此结束。".into(),
                empty_reply: "抱歉，这次没有生成出内容，请重试一次～".into(),
                shortlist_pending: "检测到可能的入围选择：{letters}。请点击“确认选择并结束讨论”以最终提交，或继续讨论以修改。".into(),
                shortlist_confirmed: "已确认最终入围：{letters}。我们将这两位安排进入最终面试。".into(),
                no_pending_shortlist: "当前没有待确认的入围选择。".into(),
                error_authentication: "⚠️ API Key 无效，请检查配置中的 api_key。".into(),
                error_rate_limited: "⏳ 触发限流，请稍后再试。".into(),
                error_connectivity: "🌐 网络或服务连接异常，请稍后再试。".into(),
                error_bad_request: "❗ 请求参数错误：{detail}".into(),
                error_unknown: "❗ 未知错误：{detail}".into(),
                letter_separator: "、",
            },
            Language::En => Self {
                completion_ack: "Got your final ranking ✅ Our collaboration ends here. Thank you for taking part!".into(),
                time_up: "⏰ Time is up. This discussion has ended. Thank you for taking part!".into(),
                chat_ended: "Chat has ended.".into(),
                start_prompt: "Please input **\"OK\"** to begin.".into(),
                retry_selection: "Please select the provided item or choose an item that has not been selected.".into(),
                step_ack: "Noted: {item}.".into(),
                closing: "All items have been selected. Thank you! This chat has ended.".into(),
                empty_reply: "Sorry, no reply was generated this time. Please try again.".into(),
                shortlist_pending: "Possible shortlist detected: {letters}. Confirm to submit it and end the discussion, or keep discussing to change it.".into(),
                shortlist_confirmed: "Final shortlist confirmed: {letters}. These candidates will move on to the final interview.".into(),
                no_pending_shortlist: "There is no pending shortlist to confirm.".into(),
                error_authentication: "⚠️ Invalid API key. Please check api_key in the config.".into(),
                error_rate_limited: "⏳ Rate limit reached. Please try again later.".into(),
                error_connectivity: "🌐 Network or service connection problem. Please try again later.".into(),
                error_bad_request: "❗ Bad request: {detail}".into(),
                error_unknown: "❗ Unknown error: {detail}".into(),
                letter_separator: ", ",
            },
        }
    }

    /// Defaults for `language`, with any overrides applied.
    pub fn resolve(language: Language, overrides: &MessageOverrides) -> Self {
        let mut m = Self::for_language(language);
        let apply = |slot: &mut String, value: &Option<String>| {
            if let Some(v) = value {
                *slot = v.clone();
            }
        };
        apply(&mut m.completion_ack, &overrides.completion_ack);
        apply(&mut m.time_up, &overrides.time_up);
        apply(&mut m.chat_ended, &overrides.chat_ended);
        apply(&mut m.start_prompt, &overrides.start_prompt);
        apply(&mut m.retry_selection, &overrides.retry_selection);
        apply(&mut m.step_ack, &overrides.step_ack);
        apply(&mut m.closing, &overrides.closing);
        apply(&mut m.empty_reply, &overrides.empty_reply);
        apply(&mut m.shortlist_pending, &overrides.shortlist_pending);
        apply(&mut m.shortlist_confirmed, &overrides.shortlist_confirmed);
        apply(&mut m.no_pending_shortlist, &overrides.no_pending_shortlist);
        apply(&mut m.error_authentication, &overrides.error_authentication);
        apply(&mut m.error_rate_limited, &overrides.error_rate_limited);
        apply(&mut m.error_connectivity, &overrides.error_connectivity);
        apply(&mut m.error_bad_request, &overrides.error_bad_request);
        apply(&mut m.error_unknown, &overrides.error_unknown);
        m
    }

    /// `A、B` or `A, B` depending on language.
    pub fn join_letters(&self, letters: &[char]) -> String {
        letters
            .iter()
            .map(char::to_string)
            .collect::<Vec<_>>()
            .join(self.letter_separator)
    }

    pub fn shortlist_pending_for(&self, letters: &[char]) -> String {
        self.shortlist_pending
            .replace("{letters}", &self.join_letters(letters))
    }

    pub fn shortlist_confirmed_for(&self, letters: &[char]) -> String {
        self.shortlist_confirmed
            .replace("{letters}", &self.join_letters(letters))
    }

    pub fn step_ack_for(&self, item: &str) -> String {
        self.step_ack.replace("{item}", item)
    }

    /// Reply shown in place of a failed completion call.
    pub fn completion_failure(&self, category: ErrorCategory, detail: &str) -> String {
        match category {
            ErrorCategory::Authentication => self.error_authentication.clone(),
            ErrorCategory::RateLimited => self.error_rate_limited.clone(),
            ErrorCategory::Connectivity => self.error_connectivity.clone(),
            ErrorCategory::BadRequest => self.error_bad_request.replace("{detail}", detail),
            ErrorCategory::Unknown => self.error_unknown.replace("{detail}", detail),
        }
    }
}
