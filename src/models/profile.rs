// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile collected at onboarding.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Self-described identity chosen during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Identity {
    #[serde(rename = "Homme")]
    Man,
    #[serde(rename = "Femme")]
    Woman,
    #[serde(rename = "Non-binaire")]
    NonBinary,
    #[serde(rename = "Genderfluid")]
    Genderfluid,
    #[serde(rename = "Agender")]
    Agender,
    #[serde(rename = "Bigender")]
    Bigender,
    #[serde(rename = "Pangender")]
    Pangender,
    #[serde(rename = "Queer")]
    Queer,
    #[serde(rename = "Questionnement")]
    Questioning,
    #[serde(rename = "Trans-homme")]
    TransMan,
    #[serde(rename = "Trans-femme")]
    TransWoman,
    #[serde(rename = "Cis-homme")]
    CisMan,
    #[serde(rename = "Cis-femme")]
    CisWoman,
    #[serde(rename = "Hétérosexuel")]
    Heterosexual,
    #[serde(rename = "Homosexuel")]
    Homosexual,
    #[serde(rename = "Bisexuel")]
    Bisexual,
    #[serde(rename = "Pansexuel")]
    Pansexual,
    #[serde(rename = "Asexuel")]
    Asexual,
    #[serde(rename = "Demisexuel")]
    Demisexual,
}

impl Identity {
    pub const ALL: [Identity; 19] = [
        Identity::Man,
        Identity::Woman,
        Identity::NonBinary,
        Identity::Genderfluid,
        Identity::Agender,
        Identity::Bigender,
        Identity::Pangender,
        Identity::Queer,
        Identity::Questioning,
        Identity::TransMan,
        Identity::TransWoman,
        Identity::CisMan,
        Identity::CisWoman,
        Identity::Heterosexual,
        Identity::Homosexual,
        Identity::Bisexual,
        Identity::Pansexual,
        Identity::Asexual,
        Identity::Demisexual,
    ];

    /// Label as stored and shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            Identity::Man => "Homme",
            Identity::Woman => "Femme",
            Identity::NonBinary => "Non-binaire",
            Identity::Genderfluid => "Genderfluid",
            Identity::Agender => "Agender",
            Identity::Bigender => "Bigender",
            Identity::Pangender => "Pangender",
            Identity::Queer => "Queer",
            Identity::Questioning => "Questionnement",
            Identity::TransMan => "Trans-homme",
            Identity::TransWoman => "Trans-femme",
            Identity::CisMan => "Cis-homme",
            Identity::CisWoman => "Cis-femme",
            Identity::Heterosexual => "Hétérosexuel",
            Identity::Homosexual => "Homosexuel",
            Identity::Bisexual => "Bisexuel",
            Identity::Pansexual => "Pansexuel",
            Identity::Asexual => "Asexuel",
            Identity::Demisexual => "Demisexuel",
        }
    }
}

/// Language the challenges (and the UI) are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Language {
    #[default]
    #[serde(rename = "Français")]
    French,
    #[serde(rename = "English")]
    English,
    #[serde(rename = "Español")]
    Spanish,
    #[serde(rename = "Deutsch")]
    German,
    #[serde(rename = "Italiano")]
    Italian,
    #[serde(rename = "Português")]
    Portuguese,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::French,
        Language::English,
        Language::Spanish,
        Language::German,
        Language::Italian,
        Language::Portuguese,
    ];

    /// Native name, also the stored value.
    pub fn label(self) -> &'static str {
        match self {
            Language::French => "Français",
            Language::English => "English",
            Language::Spanish => "Español",
            Language::German => "Deutsch",
            Language::Italian => "Italiano",
            Language::Portuguese => "Português",
        }
    }

    /// Localized application name.
    pub fn app_name(self) -> &'static str {
        match self {
            Language::French | Language::English => "Courage",
            Language::Spanish => "Valor",
            Language::German => "Mut",
            Language::Italian => "Coraggio",
            Language::Portuguese => "Coragem",
        }
    }
}

/// Persisted user profile (`challenge_user` record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Profile {
    pub name: String,
    pub identity: Identity,
    /// ISO calendar date (`YYYY-MM-DD`)
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub birth_date: NaiveDate,
    pub language: Language,
}

impl Profile {
    /// A stored profile is usable only if it still has a name.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }
}
