//! Exhaustive ranking of a corpus against a query fingerprint

use crate::types::{DistancePolicy, Fingerprint, ImageId, RankedEntry, RankedResult};
use crate::Result;

/// Order `corpus` by ascending distance to `query`.
///
/// Every member is scored; nothing is pruned. The sort is stable, so members
/// at equal distance keep their input order. Any member whose fingerprint
/// does not match the query's length fails the whole ranking.
pub fn rank<'a, I>(query: &Fingerprint, corpus: I, policy: DistancePolicy) -> Result<RankedResult>
where
    I: IntoIterator<Item = (ImageId, &'a Fingerprint)>,
{
    let mut scored = corpus
        .into_iter()
        .map(|(id, fingerprint)| Ok((id, policy.distance(query, fingerprint)?)))
        .collect::<Result<Vec<(ImageId, f64)>>>()?;

    scored.sort_by(|a, b| a.1.total_cmp(&b.1));

    Ok(RankedResult {
        method: query.method(),
        policy,
        entries: scored
            .into_iter()
            .map(|(id, distance)| RankedEntry {
                id,
                distance: Some(distance),
            })
            .collect(),
    })
}
