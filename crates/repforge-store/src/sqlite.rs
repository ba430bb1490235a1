//! SQLite exercise catalog with int8 vector search and lexical fallback.
//!
//! Embeddings are keyed by model. A query vector is only ever compared
//! with rows written by the same model and of the same dimension.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use repforge_core::{Error, Exercise, Result};

use crate::embedding::{normalized, QuantizedVector};
use crate::schema::{CATALOG_SCHEMA_SQL, USER_SCHEMA_SQL};
use crate::types::*;

/// Similarity attached to every lexical-search hit. Not comparable
/// across requests or with cosine scores.
pub const LEXICAL_FALLBACK_SIMILARITY: f64 = 0.5;

/// SQLite store holding the catalog, users, plans and workouts.
pub struct SqliteStore {
    pub(crate) conn: Mutex<Connection>,
    db_path: PathBuf,
    /// Normalized embedding matrices per model, loaded lazily.
    matrices: Mutex<HashMap<String, EmbeddingMatrix>>,
}

struct EmbeddingMatrix {
    /// Unit-length rows, shape (N, dim), in exercise id order.
    matrix: Array2<f32>,
    exercise_ids: Vec<i64>,
    dimension: usize,
}

pub(crate) fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl SqliteStore {
    /// Open or create the store. The file will be `db_dir/repforge.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir)?;
        let db_path = db_dir.join("repforge.db");

        let conn = Self::create_connection(&db_path)?;
        conn.execute_batch(&format!("{}\n{}", CATALOG_SCHEMA_SQL, USER_SCHEMA_SQL))
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
            matrices: Mutex::new(HashMap::new()),
        };

        info!(
            "SqliteStore initialized: {} exercises, path={}",
            store.count_exercises()?,
            store.db_path.display()
        );
        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err)?;
        Ok(conn)
    }

    // ---------------------------------------------------------------
    // Catalog
    // ---------------------------------------------------------------

    /// Insert a catalog entry after checking its invariants. Returns the new id.
    pub fn add_exercise(&self, exercise: &Exercise) -> Result<i64> {
        exercise.validate()?;
        let data_json = serde_json::to_string(exercise)?;

        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO exercises (slug, name, category, movement_pattern, difficulty, \
                 popularity, data_json, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .map_err(db_err)?
            .insert(params![
            exercise.slug,
            exercise.name,
            exercise.category.as_str(),
            exercise.movement_pattern,
            exercise.difficulty,
            exercise.popularity,
            data_json,
            now_millis(),
            ])
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint") {
                    Error::InvalidExercise(format!("duplicate slug {}", exercise.slug))
                } else {
                    db_err(e)
                }
            })?;
        Ok(id)
    }

    pub fn get_exercise(&self, id: i64) -> Result<Option<Exercise>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT id, data_json FROM exercises WHERE id = ?1")
            .map_err(db_err)?
            .query_row(params![id], Self::row_to_exercise)
            .optional()
            .map_err(db_err)?;
        Ok(row)
    }

    /// Whole catalog in insertion order.
    pub fn all_exercises(&self) -> Result<Vec<Exercise>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT id, data_json FROM exercises ORDER BY id")
            .map_err(db_err)?;
        let rows = stmt.query_map([], Self::row_to_exercise).map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    /// Fetch exercises by id, preserving the order of `ids`. Unknown ids are skipped.
    pub fn get_exercises(&self, ids: &[i64]) -> Result<Vec<Exercise>> {
        let mut by_id: HashMap<i64, Exercise> = self
            .all_exercises()?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Structured catalog query: filters applied directly, most popular first.
    pub fn query_catalog(&self, filters: &SearchFilters, limit: usize) -> Result<Vec<Exercise>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, data_json FROM exercises ORDER BY popularity DESC, id ASC",
            )
            .map_err(db_err)?;
        let rows = stmt.query_map([], Self::row_to_exercise).map_err(db_err)?;

        let mut out = Vec::new();
        for row in rows {
            let ex = row.map_err(db_err)?;
            if filters.matches(&ex) {
                out.push(ex);
                if out.len() >= limit {
                    break;
                }
            }
        }
        Ok(out)
    }

    pub fn count_exercises(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM exercises", [], |row| row.get(0))
            .map_err(db_err)
    }

    fn row_to_exercise(row: &rusqlite::Row<'_>) -> rusqlite::Result<Exercise> {
        let id: i64 = row.get(0)?;
        let json: String = row.get(1)?;
        let mut ex: Exercise = serde_json::from_str(&json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
        ex.id = id;
        Ok(ex)
    }

    // ---------------------------------------------------------------
    // Embeddings
    // ---------------------------------------------------------------

    /// Store a quantized embedding for an exercise under `model`.
    ///
    /// All vectors of one model must share a dimension.
    pub fn add_exercise_embedding(
        &self,
        exercise_id: i64,
        model: &str,
        embedding: &Array1<f32>,
    ) -> Result<()> {
        let q = QuantizedVector::encode(embedding);
        let conn = self.conn.lock();

        let existing_dim: Option<i64> = conn
            .prepare_cached("SELECT dimension FROM exercise_embeddings WHERE model = ?1 LIMIT 1")
            .map_err(db_err)?
            .query_row(params![model], |row| row.get(0))
            .optional()
            .map_err(db_err)?;
        if let Some(dim) = existing_dim {
            if dim as usize != q.dimension() {
                return Err(Error::EmbeddingMismatch {
                    expected: dim as usize,
                    actual: q.dimension(),
                });
            }
        }

        conn.execute(
            "INSERT OR REPLACE INTO exercise_embeddings \
             (exercise_id, model, dimension, embedding, scale, offset_val) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                exercise_id,
                model,
                q.dimension() as i64,
                q.bytes,
                q.scale,
                q.offset
            ],
        )
        .map_err(db_err)?;
        drop(conn);

        self.matrices.lock().remove(model);
        Ok(())
    }

    /// The stored vector for an exercise under `model`, if any.
    pub fn stored_embedding(&self, exercise_id: i64, model: &str) -> Result<Option<Array1<f32>>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached(
                "SELECT embedding, scale, offset_val FROM exercise_embeddings \
                 WHERE exercise_id = ?1 AND model = ?2",
            )
            .map_err(db_err)?
            .query_row(params![exercise_id, model], |row| {
                let bytes: Vec<u8> = row.get(0)?;
                let scale: f64 = row.get(1)?;
                let offset: f64 = row.get(2)?;
                Ok(QuantizedVector {
                    bytes,
                    scale: scale as f32,
                    offset: offset as f32,
                })
            })
            .optional()
            .map_err(db_err)?;
        Ok(row.map(|q| q.decode()))
    }

    /// Catalog entries with no vector stored for `model`.
    pub fn exercises_without_embedding(&self, model: &str) -> Result<Vec<Exercise>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT e.id, e.data_json FROM exercises e \
                 WHERE NOT EXISTS (SELECT 1 FROM exercise_embeddings x \
                                   WHERE x.exercise_id = e.id AND x.model = ?1) \
                 ORDER BY e.id",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![model], Self::row_to_exercise)
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    fn load_matrix(&self, model: &str) -> Result<EmbeddingMatrix> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT exercise_id, embedding, scale, offset_val FROM exercise_embeddings \
                 WHERE model = ?1 ORDER BY exercise_id",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![model], |row| {
                let id: i64 = row.get(0)?;
                let bytes: Vec<u8> = row.get(1)?;
                let scale: f64 = row.get(2)?;
                let offset: f64 = row.get(3)?;
                Ok((
                    id,
                    QuantizedVector {
                        bytes,
                        scale: scale as f32,
                        offset: offset as f32,
                    },
                ))
            })
            .map_err(db_err)?;

        let mut exercise_ids = Vec::new();
        let mut vectors = Vec::new();
        for row in rows {
            let (id, q) = row.map_err(db_err)?;
            if let Some(v) = normalized(&q.decode()) {
                exercise_ids.push(id);
                vectors.push(v);
            }
        }

        let dimension = vectors.first().map(|v| v.len()).unwrap_or(0);
        let mut matrix = Array2::zeros((vectors.len(), dimension));
        for (i, v) in vectors.iter().enumerate() {
            matrix.row_mut(i).assign(v);
        }
        debug!("Loaded {} embeddings for model {}", exercise_ids.len(), model);

        Ok(EmbeddingMatrix {
            matrix,
            exercise_ids,
            dimension,
        })
    }

    /// Cosine similarity search over stored vectors of `model`.
    ///
    /// Hits below `threshold` are dropped. Ordering is by similarity,
    /// ties keep catalog insertion order.
    pub fn vector_search(
        &self,
        query: &Array1<f32>,
        model: &str,
        threshold: f64,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<SimilarityHit>> {
        let Some(q) = normalized(query) else {
            return Ok(Vec::new());
        };

        let scored: Vec<(i64, f64)> = {
            let mut matrices = self.matrices.lock();
            if !matrices.contains_key(model) {
                let loaded = self.load_matrix(model)?;
                matrices.insert(model.to_string(), loaded);
            }
            let Some(m) = matrices.get(model) else {
                return Ok(Vec::new());
            };
            if m.exercise_ids.is_empty() {
                return Err(Error::ProviderUnavailable(format!(
                    "no catalog embeddings stored for model {}",
                    model
                )));
            }
            if m.dimension != q.len() {
                return Err(Error::EmbeddingMismatch {
                    expected: m.dimension,
                    actual: q.len(),
                });
            }
            let sims = m.matrix.dot(&q);
            m.exercise_ids
                .iter()
                .zip(sims.iter())
                .map(|(&id, &s)| (id, s as f64))
                .collect()
        };

        let catalog: HashMap<i64, Exercise> = self
            .all_exercises()?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        let mut hits: Vec<SimilarityHit> = scored
            .into_iter()
            .filter(|&(_, s)| s >= threshold)
            .filter(|(id, _)| catalog.get(id).is_some_and(|ex| filters.matches(ex)))
            .map(|(id, similarity)| SimilarityHit { id, similarity })
            .collect();
        // sort_by is stable: equal similarities stay in id order.
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        Ok(hits)
    }

    // ---------------------------------------------------------------
    // Lexical search
    // ---------------------------------------------------------------

    /// Substring match over name/description/search text plus exact token
    /// match over primary muscles and tags. Every hit carries
    /// [`LEXICAL_FALLBACK_SIMILARITY`].
    pub fn lexical_search(
        &self,
        terms: &[String],
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<SimilarityHit>> {
        let terms: Vec<String> = terms
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits = Vec::new();
        for ex in self.all_exercises()? {
            if !filters.matches(&ex) {
                continue;
            }
            let text = format!(
                "{}\n{}\n{}",
                ex.name.to_lowercase(),
                ex.description.to_lowercase(),
                ex.search_text.to_lowercase()
            );
            let token_hit = |t: &String| {
                ex.primary_muscles
                    .iter()
                    .chain(ex.tags.iter())
                    .any(|m| m.eq_ignore_ascii_case(t))
            };
            if terms.iter().any(|t| text.contains(t.as_str()) || token_hit(t)) {
                hits.push(SimilarityHit {
                    id: ex.id,
                    similarity: LEXICAL_FALLBACK_SIMILARITY,
                });
                if hits.len() >= limit {
                    break;
                }
            }
        }
        Ok(hits)
    }

    // ---------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------

    pub fn get_stats(&self) -> Result<CatalogStats> {
        let exercises = self.count_exercises()?;
        let conn = self.conn.lock();
        let embeddings: i64 = conn
            .query_row("SELECT COUNT(*) FROM exercise_embeddings", [], |row| row.get(0))
            .map_err(db_err)?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT model FROM exercise_embeddings ORDER BY model")
            .map_err(db_err)?;
        let embedding_models = stmt
            .query_map([], |row| row.get(0))
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<String>>>()
            .map_err(db_err)?;

        Ok(CatalogStats {
            exercises,
            embeddings,
            embedding_models,
            db_path: self.db_path.display().to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use repforge_core::Location;
    use tempfile::TempDir;

    pub(crate) fn test_store() -> (SqliteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path()).unwrap();
        (store, dir)
    }

    pub(crate) fn exercise(slug: &str, pattern: &str, muscles: &[&str]) -> Exercise {
        serde_json::from_value(serde_json::json!({
            "name": slug.replace('-', " "),
            "slug": slug,
            "description": format!("{} exercise", pattern),
            "category": "strength",
            "movement_pattern": pattern,
            "exercise_type": "compound",
            "primary_muscles": muscles,
            "difficulty": 2,
            "home_compatibility": 1.0,
            "gym_compatibility": 1.0,
            "outdoor_compatibility": 0.2
        }))
        .unwrap()
    }

    #[test]
    fn test_add_and_get_exercise() {
        let (store, _dir) = test_store();
        let id = store
            .add_exercise(&exercise("push-up", "horizontal_push", &["chest"]))
            .unwrap();
        let ex = store.get_exercise(id).unwrap().unwrap();
        assert_eq!(ex.id, id);
        assert_eq!(ex.slug, "push-up");
        assert!(store.get_exercise(id + 100).unwrap().is_none());
        assert_eq!(store.count_exercises().unwrap(), 1);
    }

    #[test]
    fn test_invalid_and_duplicate_rejected() {
        let (store, _dir) = test_store();
        let mut bad = exercise("bad", "squat", &["quadriceps"]);
        bad.difficulty = 0;
        assert!(matches!(store.add_exercise(&bad), Err(Error::InvalidExercise(_))));

        let ok = exercise("row", "horizontal_pull", &["back"]);
        store.add_exercise(&ok).unwrap();
        assert!(matches!(store.add_exercise(&ok), Err(Error::InvalidExercise(_))));
    }

    #[test]
    fn test_query_catalog_orders_by_popularity() {
        let (store, _dir) = test_store();
        let mut a = exercise("a", "hinge", &["hamstrings"]);
        a.popularity = 1;
        let mut b = exercise("b", "hinge", &["hamstrings"]);
        b.popularity = 9;
        let mut c = exercise("c", "hinge", &["hamstrings"]);
        c.outdoor_compatibility = 0.9;
        store.add_exercise(&a).unwrap();
        store.add_exercise(&b).unwrap();
        store.add_exercise(&c).unwrap();

        let all = store.query_catalog(&SearchFilters::default(), 10).unwrap();
        let slugs: Vec<&str> = all.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["b", "a", "c"]);

        let outdoor = SearchFilters {
            location: Some(Location::Outdoor),
            ..Default::default()
        };
        let only_c = store.query_catalog(&outdoor, 10).unwrap();
        assert_eq!(only_c.len(), 1);
        assert_eq!(only_c[0].slug, "c");
    }

    #[test]
    fn test_vector_search_ranks_and_thresholds() {
        let (store, _dir) = test_store();
        let a = store.add_exercise(&exercise("a", "push", &["chest"])).unwrap();
        let b = store.add_exercise(&exercise("b", "pull", &["back"])).unwrap();
        let c = store.add_exercise(&exercise("c", "squat", &["quadriceps"])).unwrap();

        store.add_exercise_embedding(a, "m", &ndarray::array![1.0, 0.0, 0.0]).unwrap();
        store.add_exercise_embedding(b, "m", &ndarray::array![0.8, 0.6, 0.0]).unwrap();
        store.add_exercise_embedding(c, "m", &ndarray::array![0.0, 0.0, 1.0]).unwrap();

        let hits = store
            .vector_search(&ndarray::array![1.0, 0.1, 0.0], "m", 0.5, 10, &SearchFilters::default())
            .unwrap();
        let ids: Vec<i64> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert!(hits.iter().all(|h| h.similarity >= 0.5 && h.similarity <= 1.0 + 1e-6));
    }

    #[test]
    fn test_vector_search_ties_keep_insertion_order() {
        let (store, _dir) = test_store();
        let first = store.add_exercise(&exercise("first", "push", &["chest"])).unwrap();
        let second = store.add_exercise(&exercise("second", "push", &["chest"])).unwrap();
        for id in [second, first] {
            store.add_exercise_embedding(id, "m", &ndarray::array![0.0, 1.0]).unwrap();
        }
        let hits = store
            .vector_search(&ndarray::array![0.0, 2.0], "m", 0.0, 10, &SearchFilters::default())
            .unwrap();
        assert_eq!(hits[0].id, first);
        assert_eq!(hits[1].id, second);
    }

    #[test]
    fn test_vector_search_rejects_other_models_and_dims() {
        let (store, _dir) = test_store();
        let a = store.add_exercise(&exercise("a", "push", &["chest"])).unwrap();
        store.add_exercise_embedding(a, "small", &ndarray::array![1.0, 0.0]).unwrap();

        let err = store
            .vector_search(&ndarray::array![1.0, 0.0, 0.0], "small", 0.0, 5, &SearchFilters::default())
            .unwrap_err();
        assert!(matches!(err, Error::EmbeddingMismatch { expected: 2, actual: 3 }));

        let err = store
            .vector_search(&ndarray::array![1.0, 0.0], "other", 0.0, 5, &SearchFilters::default())
            .unwrap_err();
        assert!(matches!(err, Error::ProviderUnavailable(_)));

        let err = store
            .add_exercise_embedding(a, "small", &ndarray::array![1.0, 0.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, Error::EmbeddingMismatch { .. }));
    }

    #[test]
    fn test_stored_embedding_and_pending() {
        let (store, _dir) = test_store();
        let a = store.add_exercise(&exercise("a", "push", &["chest"])).unwrap();
        let b = store.add_exercise(&exercise("b", "pull", &["back"])).unwrap();
        store.add_exercise_embedding(a, "m", &ndarray::array![0.2, 0.9]).unwrap();

        let v = store.stored_embedding(a, "m").unwrap().unwrap();
        assert!((v[1] - 0.9).abs() < 0.01);
        assert!(store.stored_embedding(b, "m").unwrap().is_none());

        let pending = store.exercises_without_embedding("m").unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b);

        let stats = store.get_stats().unwrap();
        assert_eq!(stats.embeddings, 1);
        assert_eq!(stats.embedding_models, vec!["m".to_string()]);
    }

    #[test]
    fn test_lexical_search() {
        let (store, _dir) = test_store();
        let mut plank = exercise("plank", "anti_extension", &["core"]);
        plank.tags = vec!["isometric".into()];
        let plank_id = store.add_exercise(&plank).unwrap();
        let row_id = store
            .add_exercise(&exercise("bent-over-row", "horizontal_pull", &["back"]))
            .unwrap();

        let hits = store
            .lexical_search(&["Row".into()], 10, &SearchFilters::default())
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, row_id);
        assert_eq!(hits[0].similarity, LEXICAL_FALLBACK_SIMILARITY);

        let hits = store
            .lexical_search(&["isometric".into()], 10, &SearchFilters::default())
            .unwrap();
        assert_eq!(hits[0].id, plank_id);

        assert!(store
            .lexical_search(&[" ".into()], 10, &SearchFilters::default())
            .unwrap()
            .is_empty());
    }
}
