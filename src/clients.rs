pub(crate) mod comment_hub;

pub(crate) use comment_hub::CommentHubClient;
