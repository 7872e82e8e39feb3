use crate::quicksort::RecursionContext;
use crate::stats::SortStats;

/// Runs the sorts of the two halves of a partition step, either in parallel or one after the
/// other in the current task.
///
/// `len` is the length of the slice that was split. The halves are forked if it exceeds
/// `parallel_threshold` and the context still has parallel budget left. Forked halves each get a
/// context with one less unit of budget, sequential halves get `ctx` unchanged, so a subtree that
/// ran out of budget never forks again.
///
/// Returns only after both halves are done. If one half panics the other still runs to
/// completion before the panic is propagated, there are no detached tasks.
pub(crate) fn fork<A, B>(
    ctx: RecursionContext,
    len: usize,
    parallel_threshold: usize,
    stats: &SortStats,
    oper_a: A,
    oper_b: B,
) where
    A: FnOnce(RecursionContext) + Send,
    B: FnOnce(RecursionContext) + Send,
{
    if len > parallel_threshold && ctx.parallel_budget > 0 {
        let child_ctx = ctx.spend_parallel_budget();
        stats.record_fork();

        rayon::join(|| oper_a(child_ctx), || oper_b(child_ctx));
    } else {
        oper_a(ctx);
        oper_b(ctx);
    }
}
