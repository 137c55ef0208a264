use async_graphql::Context;
use uuid::Uuid;

use crate::auth::Claims;
use crate::gql::error::LeagueError;

fn claims<'a>(ctx: &'a Context<'_>) -> Result<&'a Claims, LeagueError> {
    ctx.data::<Claims>().map_err(|_| {
        LeagueError::Unauthorized("You must be logged in to perform this action".into())
    })
}

/// Allow the acting user on their own records, or any admin.
pub fn require_self_or_admin(ctx: &Context<'_>, user_id: Uuid) -> Result<(), LeagueError> {
    let claims = claims(ctx)?;
    if claims.is_admin() || claims.user_id() == Some(user_id) {
        Ok(())
    } else {
        Err(LeagueError::Unauthorized(
            "You can only act on your own league records".into(),
        ))
    }
}

pub fn require_admin(ctx: &Context<'_>) -> Result<(), LeagueError> {
    let claims = claims(ctx)?;
    if claims.is_admin() {
        Ok(())
    } else {
        Err(LeagueError::Unauthorized(
            "Administrator privileges required".into(),
        ))
    }
}
