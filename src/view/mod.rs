mod island_view;

pub use island_view::IslandView;
