use rand::Rng;

use crate::domain::Task;

/// Picks a random active task. When more than one task is active the
/// previously shown one is excluded, so the same task never appears twice in a
/// row; with a single active task it is returned every time. Returns `None`
/// when nothing is active.
pub fn pick_next<'a, R: Rng + ?Sized>(
    tasks: &'a [Task],
    previous_task_id: Option<&str>,
    rng: &mut R,
) -> Option<&'a Task> {
    let active = tasks.iter().filter(|task| task.is_active).collect::<Vec<_>>();
    if active.is_empty() {
        return None;
    }

    let candidates = match previous_task_id {
        Some(previous) if active.len() > 1 && active.iter().any(|task| task.id == previous) => active
            .into_iter()
            .filter(|task| task.id != previous)
            .collect::<Vec<_>>(),
        _ => active,
    };

    let index = rng.gen_range(0..candidates.len());
    Some(candidates[index])
}
