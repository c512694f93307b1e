//! Traditional holidays annotated onto day records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Solar term whose eve is the Cold Food festival.
pub const QINGMING: &str = "清明";

/// The eleven fixed traditional observances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Holiday {
    /// 12th month, day 8.
    Laba,
    /// Day before the lunar new year.
    NewYearsEve,
    /// 1st month, day 1.
    LunarNewYear,
    /// 1st month, day 15.
    Lantern,
    /// Day before the Qingming solar term.
    ColdFood,
    /// 5th month, day 5.
    DragonBoat,
    /// 7th month, day 7.
    DoubleSeventh,
    /// 7th month, day 15.
    Ghost,
    /// 8th month, day 15.
    MidAutumn,
    /// 9th month, day 9.
    DoubleNinth,
    /// 10th month, day 15.
    Xiayuan,
}

impl Holiday {
    pub const ALL: [Holiday; 11] = [
        Holiday::Laba,
        Holiday::NewYearsEve,
        Holiday::LunarNewYear,
        Holiday::Lantern,
        Holiday::ColdFood,
        Holiday::DragonBoat,
        Holiday::DoubleSeventh,
        Holiday::Ghost,
        Holiday::MidAutumn,
        Holiday::DoubleNinth,
        Holiday::Xiayuan,
    ];

    /// Short label stored in the day store and shown in event titles.
    pub fn label(self) -> &'static str {
        match self {
            Holiday::Laba => "腊八",
            Holiday::NewYearsEve => "除夕",
            Holiday::LunarNewYear => "春节",
            Holiday::Lantern => "元宵",
            Holiday::ColdFood => "寒食",
            Holiday::DragonBoat => "端午",
            Holiday::DoubleSeventh => "七夕",
            Holiday::Ghost => "中元",
            Holiday::MidAutumn => "中秋",
            Holiday::DoubleNinth => "重阳",
            Holiday::Xiayuan => "下元",
        }
    }

    /// Reverse of [`Holiday::label`].
    pub fn from_label(label: &str) -> Option<Holiday> {
        Holiday::ALL
            .into_iter()
            .find(|holiday| holiday.label() == label)
    }
}

impl Display for Holiday {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One derived `(date, holiday)` write, applied after the derivation scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HolidayAssignment {
    pub date: NaiveDate,
    pub holiday: Holiday,
}
