mod publish;
mod stats;
mod unpublish;
mod unstage;
