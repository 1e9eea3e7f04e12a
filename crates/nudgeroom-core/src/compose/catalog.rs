//! Message templates per locale and nudge type.
//!
//! Placeholders per type:
//!
//! | type               | variables                    |
//! |--------------------|------------------------------|
//! | `morning_briefing` | `events`, `tasks`            |
//! | `evening_wrapup`   | `done`, `left`               |
//! | `meeting_reminder` | `title`, `minutes`           |
//! | `focus_suggest`    | `task`                       |
//! | `task_nudge`       | `title`, `hours`             |
//! | `overload_warn`    | `count`, `hours`             |
//! | `rest_suggest`     | `minutes`                    |
//! | `late_warning`     | `title`, `minutes`, `location` |
//! | `streak_celebrate` | `days`                       |
//! | `departure_alert`  | `title`, `location`, `travel` |

use super::Locale;
use crate::nudge::{NudgeType, Tone};
use Tone::{Apologetic, Encouraging, Neutral};

/// One title/body pair with its voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub title: &'static str,
    pub body: &'static str,
    pub tone: Tone,
}

macro_rules! t {
    ($title:expr, $body:expr, $tone:expr) => {
        Template {
            title: $title,
            body: $body,
            tone: $tone,
        }
    };
}

/// Templates for `nudge_type` in `locale`. Never empty.
pub fn templates(locale: Locale, nudge_type: NudgeType) -> &'static [Template] {
    match locale {
        Locale::En => en(nudge_type),
        Locale::Ja => ja(nudge_type),
    }
}

fn en(nudge_type: NudgeType) -> &'static [Template] {
    match nudge_type {
        NudgeType::MorningBriefing => &[
            t!("Good morning", "{events} events and {tasks} open tasks today.", Encouraging),
            t!("Today at a glance", "You have {events} events on the calendar and {tasks} tasks waiting.", Neutral),
        ],
        NudgeType::EveningWrapup => &[
            t!("Nice work today", "You finished {done} tasks. {left} left for tomorrow.", Encouraging),
            t!("Day wrap-up", "{done} done, {left} still open.", Neutral),
        ],
        NudgeType::MeetingReminder => &[
            t!("{title} in {minutes} min", "Time to wrap up and get ready.", Neutral),
            t!("Coming up: {title}", "Starts in {minutes} minutes.", Neutral),
            t!("Heads up", "{title} begins in {minutes} minutes.", Encouraging),
        ],
        NudgeType::FocusSuggest => &[
            t!("Good time to focus", "Your calendar is clear. How about working on {task}?", Encouraging),
            t!("Focus window", "This is one of your sharpest hours. Start on {task}?", Encouraging),
        ],
        NudgeType::TaskNudge => &[
            t!("Still on your list", "{title} hasn't moved in {hours} hours.", Neutral),
            t!("Remember {title}?", "Sorry to nag, it has been {hours} hours. A small step counts.", Apologetic),
        ],
        NudgeType::OverloadWarn => &[
            t!("Busy stretch ahead", "{count} events in the next {hours} hours. Anything you can move?", Apologetic),
            t!("Packed schedule", "You have {count} events coming up within {hours} hours.", Neutral),
        ],
        NudgeType::RestSuggest => &[
            t!("Time for a break", "You've been focused for {minutes} minutes. Stretch your legs.", Encouraging),
            t!("Take five", "{minutes} minutes of focus. A short rest keeps you sharp.", Encouraging),
        ],
        NudgeType::LateWarning => &[
            t!("You may be late for {title}", "Travel to {location} puts you about {minutes} min behind.", Apologetic),
            t!("Running behind", "Leaving now, you'd reach {title} roughly {minutes} minutes late.", Apologetic),
        ],
        NudgeType::StreakCelebrate => &[
            t!("{days}-day streak!", "You've focused {days} days in a row. Keep it going!", Encouraging),
            t!("Streak milestone", "{days} days straight. Impressive.", Encouraging),
        ],
        NudgeType::DepartureAlert => &[
            t!("Time to leave for {title}", "Head to {location} now. Travel takes about {travel} min.", Neutral),
            t!("Leave now", "{title} at {location}, {travel} minutes away.", Neutral),
        ],
    }
}

fn ja(nudge_type: NudgeType) -> &'static [Template] {
    match nudge_type {
        NudgeType::MorningBriefing => &[
            t!("おはようございます", "今日は予定が{events}件、タスクが{tasks}件あります。", Encouraging),
            t!("今日の予定", "カレンダーに{events}件、未完了タスクが{tasks}件です。", Neutral),
        ],
        NudgeType::EveningWrapup => &[
            t!("今日もお疲れさまでした", "{done}件のタスクを完了しました。残りは{left}件です。", Encouraging),
            t!("一日のふりかえり", "完了{done}件、残り{left}件。", Neutral),
        ],
        NudgeType::MeetingReminder => &[
            t!("{title}まであと{minutes}分", "そろそろ準備を始めましょう。", Neutral),
            t!("まもなく: {title}", "{minutes}分後に始まります。", Neutral),
        ],
        NudgeType::FocusSuggest => &[
            t!("集中のチャンス", "予定が空いています。{task}に取り組みませんか?", Encouraging),
            t!("集中タイム", "今は集中しやすい時間帯です。{task}を始めましょう。", Encouraging),
        ],
        NudgeType::TaskNudge => &[
            t!("気になるタスク", "{title}が{hours}時間止まっています。", Neutral),
            t!("{title}を覚えていますか?", "しつこくてすみません、{hours}時間経ちました。少しだけ進めませんか?", Apologetic),
        ],
        NudgeType::OverloadWarn => &[
            t!("予定が詰まっています", "この{hours}時間で{count}件の予定があります。動かせるものはありますか?", Apologetic),
            t!("忙しい時間帯", "{hours}時間以内に{count}件の予定が入っています。", Neutral),
        ],
        NudgeType::RestSuggest => &[
            t!("休憩しましょう", "{minutes}分集中しました。少し体を動かしましょう。", Encouraging),
            t!("ひと息つきませんか", "{minutes}分経過しました。短い休憩で集中力が戻ります。", Encouraging),
        ],
        NudgeType::LateWarning => &[
            t!("{title}に遅れそうです", "{location}への移動で約{minutes}分遅れる見込みです。", Apologetic),
            t!("遅刻の可能性", "今出発しても{title}に{minutes}分ほど遅れそうです。", Apologetic),
        ],
        NudgeType::StreakCelebrate => &[
            t!("{days}日連続!", "{days}日連続で集中できています。この調子で!", Encouraging),
            t!("連続記録達成", "{days}日連続です。すばらしい!", Encouraging),
        ],
        NudgeType::DepartureAlert => &[
            t!("{title}に出発する時間です", "{location}まで約{travel}分かかります。", Neutral),
            t!("そろそろ出発", "{title}({location})まで{travel}分。", Neutral),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_has_templates_in_every_locale() {
        for locale in Locale::ALL {
            for nudge_type in NudgeType::ALL {
                assert!(!templates(locale, nudge_type).is_empty(), "{locale:?} {nudge_type}");
            }
        }
    }
}
