//! Locale-dependent text: default failure messages and date formatting.

use chrono::{Datelike, NaiveDateTime};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    ZhCn,
    EnUs,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "zh" | "zh-cn" => Ok(Self::ZhCn),
            "en" | "en-us" => Ok(Self::EnUs),
            other => Err(format!("unsupported locale `{other}`")),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ZhCn => "zh-CN",
            Self::EnUs => "en-US",
        })
    }
}

/// Store operations that carry a default failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FetchPosts,
    FetchPost,
    CreatePost,
    UpdatePost,
    DeletePost,
    LikePost,
    UnlikePost,
    AddComment,
    Login,
    Register,
    FetchUserInfo,
    UpdateProfile,
    ChangePassword,
}

impl Operation {
    pub fn default_message(self, locale: Locale) -> &'static str {
        match locale {
            Locale::ZhCn => match self {
                Self::FetchPosts => "获取博客列表失败",
                Self::FetchPost => "获取博客详情失败",
                Self::CreatePost => "创建博客失败",
                Self::UpdatePost => "更新博客失败",
                Self::DeletePost => "删除博客失败",
                Self::LikePost => "点赞失败",
                Self::UnlikePost => "取消点赞失败",
                Self::AddComment => "评论发表失败",
                Self::Login => "登录失败，请检查用户名和密码",
                Self::Register => "注册失败，请稍后重试",
                Self::FetchUserInfo => "获取用户信息失败",
                Self::UpdateProfile => "更新个人资料失败",
                Self::ChangePassword => "修改密码失败",
            },
            Locale::EnUs => match self {
                Self::FetchPosts => "Failed to load posts",
                Self::FetchPost => "Failed to load post",
                Self::CreatePost => "Failed to create post",
                Self::UpdatePost => "Failed to update post",
                Self::DeletePost => "Failed to delete post",
                Self::LikePost => "Failed to like post",
                Self::UnlikePost => "Failed to unlike post",
                Self::AddComment => "Failed to post comment",
                Self::Login => "Login failed, please check your username and password",
                Self::Register => "Registration failed, please try again later",
                Self::FetchUserInfo => "Failed to load user information",
                Self::UpdateProfile => "Failed to update profile",
                Self::ChangePassword => "Failed to change password",
            },
        }
    }

    /// Name used in log fields.
    pub fn name(self) -> &'static str {
        match self {
            Self::FetchPosts => "fetch_posts",
            Self::FetchPost => "fetch_post_by_id",
            Self::CreatePost => "create_post",
            Self::UpdatePost => "update_post",
            Self::DeletePost => "delete_post",
            Self::LikePost => "like_post",
            Self::UnlikePost => "unlike_post",
            Self::AddComment => "add_comment",
            Self::Login => "login",
            Self::Register => "register",
            Self::FetchUserInfo => "fetch_user_info",
            Self::UpdateProfile => "update_profile",
            Self::ChangePassword => "change_password",
        }
    }
}

const EN_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Long-form date, e.g. `2023年4月15日` or `April 15, 2023`.
pub fn format_date(date: &NaiveDateTime, locale: Locale) -> String {
    match locale {
        Locale::ZhCn => format!("{}年{}月{}日", date.year(), date.month(), date.day()),
        Locale::EnUs => format!(
            "{} {}, {}",
            EN_MONTHS[date.month0() as usize],
            date.day(),
            date.year()
        ),
    }
}
