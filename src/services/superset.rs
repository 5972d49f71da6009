//! Superset grouping for the exercises of a single training.
//!
//! A coach marks exercises performed back-to-back by listing partner ids in
//! `supersets`. Every exercise involved in such a list ends up sharing a
//! `superset_id`; the first group an exercise joins is the one it keeps.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ExerciseInput, NewTraining, NewTrainingExercise, TrainingInput};

/// Group id for each exercise, index-aligned with `exercises`
pub fn assign_superset_ids(exercises: &[ExerciseInput]) -> Vec<Option<Uuid>> {
    let mut groups: HashMap<Uuid, Uuid> = HashMap::new();

    for exercise in exercises {
        if exercise.supersets.is_empty() {
            continue;
        }

        let group = *groups.entry(exercise.id).or_insert_with(Uuid::new_v4);
        for partner in &exercise.supersets {
            groups.entry(*partner).or_insert(group);
        }
    }

    exercises
        .iter()
        .map(|exercise| groups.get(&exercise.id).copied())
        .collect()
}

/// Partners must be exercises of the same training
pub fn validate_superset_references(training: &TrainingInput) -> AppResult<()> {
    let ids: HashSet<Uuid> = training.exercises.iter().map(|e| e.id).collect();

    for exercise in &training.exercises {
        if let Some(missing) = exercise.supersets.iter().find(|id| !ids.contains(id)) {
            return Err(AppError::Validation(format!(
                "Superset of exercise {} in training '{}' references exercise {} which is not part of that training",
                exercise.id, training.name, missing
            )));
        }
    }

    Ok(())
}

/// Turn a training from the request into rows ready to insert
pub fn build_training(ordering: usize, training: &TrainingInput) -> AppResult<NewTraining> {
    validate_superset_references(training)?;
    let superset_ids = assign_superset_ids(&training.exercises);

    let exercises = training
        .exercises
        .iter()
        .zip(superset_ids)
        .enumerate()
        .map(|(index, (exercise, superset_id))| NewTrainingExercise {
            exercise_id: exercise.id,
            sets: exercise.sets.trim().to_string(),
            superset_id,
            ordering: index as i32,
        })
        .collect();

    Ok(NewTraining {
        name: training.name.trim().to_string(),
        ordering: ordering as i32,
        exercises,
    })
}
