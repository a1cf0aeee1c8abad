use async_trait::async_trait;
use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    path::Path,
    sync::{Mutex, PoisonError},
};

use super::{Catalog, CatalogEntry, CatalogError, CatalogResult, QuestionFilters};
use crate::game::{Difficulty, MediaRef, PrecisionQuestion, Question, QuestionId, QuestionType};

/// On-disk catalog layout.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub questions: Vec<CatalogEntry>,
    #[serde(default)]
    pub precision: Vec<PrecisionQuestion>,
}

/// Serves a fixed set of questions, picking pseudo-randomly among the ones
/// a session hasn't seen yet.
pub struct InMemoryCatalog {
    entries: Vec<CatalogEntry>,
    precision: Vec<PrecisionQuestion>,
    rng: Mutex<StdRng>,
}

impl InMemoryCatalog {
    pub fn new(entries: Vec<CatalogEntry>, precision: Vec<PrecisionQuestion>) -> Self {
        Self {
            entries,
            precision,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Fixes the pick order for reproducible games.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub async fn from_json_file(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let file: CatalogFile = serde_json::from_str(&raw)?;
        info!(
            "Loaded {} questions and {} precision questions from {}",
            file.questions.len(),
            file.precision.len(),
            path.display()
        );
        Ok(Self::new(file.questions, file.precision))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A small built-in catalog for development and demos.
    #[must_use]
    pub fn sample() -> Self {
        let entry = |id: &str,
                     question_type: QuestionType,
                     difficulty: Difficulty,
                     text: &str,
                     answers: &[&str],
                     media: Option<&str>| CatalogEntry {
            question: Question {
                id: id.to_string(),
                question_type,
                difficulty,
                text: text.to_string(),
                answers: answers.iter().map(|a| a.to_string()).collect(),
            },
            media: media.map(|uri| MediaRef {
                uri: uri.to_string(),
                duration_secs: Some(20),
            }),
        };

        use Difficulty::{Easy, Hard, Medium};
        use QuestionType::{Album, Artist, Lyrics, Song, Year};
        let entries = vec![
            entry("song-01", Song, Easy, "Name this song", &["Bohemian Rhapsody"], Some("previews/song-01.mp3")),
            entry("song-02", Song, Medium, "Name this song", &["Smells Like Teen Spirit"], Some("previews/song-02.mp3")),
            entry("song-03", Song, Hard, "Name this song", &["Paranoid Android"], Some("previews/song-03.mp3")),
            entry("artist-01", Artist, Easy, "Who performs this track?", &["ABBA"], Some("previews/artist-01.mp3")),
            entry("artist-02", Artist, Medium, "Who performs this track?", &["Daft Punk"], Some("previews/artist-02.mp3")),
            entry("artist-03", Artist, Hard, "Who performs this track?", &["Can"], Some("previews/artist-03.mp3")),
            entry("album-01", Album, Easy, "Which album opens with this track?", &["Thriller"], Some("previews/album-01.mp3")),
            entry("album-02", Album, Medium, "Which album is this track from?", &["OK Computer"], Some("previews/album-02.mp3")),
            entry("year-01", Year, Easy, "In which year was this single released?", &["1984"], Some("previews/year-01.mp3")),
            entry("year-02", Year, Hard, "In which year was this single released?", &["1977"], None),
            entry("lyrics-01", Lyrics, Easy, "Finish the line: \"Is this the real life...\"", &["Is this just fantasy"], None),
            entry("lyrics-02", Lyrics, Medium, "Finish the line: \"Hello from the other side...\"", &["I must have called a thousand times"], None),
        ];

        let precision = [
            ("Which band released \"Abbey Road\"?", "The Beatles"),
            ("Who sang \"Like a Prayer\"?", "Madonna"),
            ("In which year did Woodstock take place?", "1969"),
            ("Which city is Motown named after?", "Detroit"),
            ("Who is known as the Queen of Soul?", "Aretha Franklin"),
            ("Which instrument does a drummer play?", "Drums"),
        ]
        .into_iter()
        .map(|(prompt, answer)| PrecisionQuestion {
            prompt: prompt.to_string(),
            answers: vec![answer.to_string()],
        })
        .collect();

        Self::new(entries, precision)
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn next_question(
        &self,
        used: &HashSet<QuestionId>,
        filters: &QuestionFilters,
    ) -> CatalogResult<CatalogEntry> {
        let candidates: Vec<&CatalogEntry> = self
            .entries
            .iter()
            .filter(|e| !used.contains(&e.question.id) && filters.matches(&e.question))
            .collect();
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = candidates
            .choose(&mut *rng)
            .copied()
            .ok_or(CatalogError::Exhausted)?;
        debug!(
            "Picked {} out of {} candidates",
            entry.question.id,
            candidates.len()
        );
        Ok(entry.clone())
    }

    async fn precision_questions(&self, count: usize) -> CatalogResult<Vec<PrecisionQuestion>> {
        if self.precision.len() < count {
            return Err(CatalogError::NotEnoughPrecisionQuestions {
                needed: count,
                available: self.precision.len(),
            });
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self
            .precision
            .choose_multiple(&mut *rng, count)
            .cloned()
            .collect())
    }
}
